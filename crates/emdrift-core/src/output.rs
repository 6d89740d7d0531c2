// ─────────────────────────────────────────────────────────────────────
// SCPN EM-Drift — Output Registry
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use emdrift_types::state::{Field2D, Field3D};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Field3D,
    Field2D,
    Scalar,
}

/// One named diagnostic. `every_step` entries are written at each output
/// time, the rest once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputEntry {
    pub name: &'static str,
    pub kind: OutputKind,
    pub every_step: bool,
}

/// Current value of a registered output.
#[derive(Debug, Clone, Copy)]
pub enum OutputValue<'a> {
    Field3D(&'a Field3D),
    Field2D(&'a Field2D),
    Scalar(f64),
}

impl OutputValue<'_> {
    pub fn kind(&self) -> OutputKind {
        match self {
            OutputValue::Field3D(_) => OutputKind::Field3D,
            OutputValue::Field2D(_) => OutputKind::Field2D,
            OutputValue::Scalar(_) => OutputKind::Scalar,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OutputRegistry {
    entries: Vec<OutputEntry>,
}

impl OutputRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name`; a second registration of the same name replaces it.
    pub fn add(&mut self, name: &'static str, kind: OutputKind, every_step: bool) {
        let entry = OutputEntry {
            name,
            kind,
            every_step,
        };
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn get(&self, name: &str) -> Option<&OutputEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn entries(&self) -> &[OutputEntry] {
        &self.entries
    }

    pub fn time_varying(&self) -> impl Iterator<Item = &OutputEntry> {
        self.entries.iter().filter(|e| e.every_step)
    }

    pub fn run_constants(&self) -> impl Iterator<Item = &OutputEntry> {
        self.entries.iter().filter(|e| !e.every_step)
    }
}
