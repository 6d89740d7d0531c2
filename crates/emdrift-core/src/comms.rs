// ─────────────────────────────────────────────────────────────────────
// SCPN EM-Drift — Poloidal Domain Decomposition and Halo Exchange
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Poloidal (y) domain decomposition and collective halo exchange.
//!
//! Each partition owns a contiguous range of poloidal rows plus `halo`
//! guard rows on each side. An exchange sends the outermost core rows to
//! both neighbours, fills the guard rows from what arrives, then waits on
//! a barrier shared by every partition. A partition that cannot take part
//! sends an abort message instead of rows; every partition then returns an
//! error from the same exchange. At the global poloidal ends the
//! guard rows either wrap around (closed flux surfaces, optionally twisted
//! by the twist-shift angle) or repeat the nearest core row.

use emdrift_math::fft::ZTransform;
use emdrift_types::error::{DriftError, DriftResult};
use emdrift_types::state::Field3D;
use ndarray::{s, Axis};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Barrier, Mutex, PoisonError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainSlice {
    pub rank: usize,
    pub nranks: usize,
    pub global_ny: usize,
    pub local_ny: usize,
    pub halo: usize,
    pub y_start: usize,
    pub y_end: usize,
}

impl DomainSlice {
    pub fn has_lower_neighbor(&self) -> bool {
        self.rank > 0
    }

    pub fn has_upper_neighbor(&self) -> bool {
        self.rank + 1 < self.nranks
    }

    pub fn owns(&self, global_y: usize) -> bool {
        (self.y_start..self.y_end).contains(&global_y)
    }
}

pub fn decompose_y(global_ny: usize, nranks: usize, halo: usize) -> DriftResult<Vec<DomainSlice>> {
    if global_ny < 1 {
        return Err(DriftError::PhysicsViolation(
            "Decomposition requires global_ny >= 1".to_string(),
        ));
    }
    if nranks < 1 {
        return Err(DriftError::PhysicsViolation(
            "Decomposition requires nranks >= 1".to_string(),
        ));
    }
    if nranks > global_ny {
        return Err(DriftError::PhysicsViolation(format!(
            "Cannot split global_ny={global_ny} across nranks={nranks}"
        )));
    }
    if halo == 0 {
        return Err(DriftError::PhysicsViolation(
            "Halo width must be >= 1".to_string(),
        ));
    }

    let base = global_ny / nranks;
    let rem = global_ny % nranks;
    let mut out = Vec::with_capacity(nranks);
    let mut cursor = 0usize;
    for rank in 0..nranks {
        let local_ny = base + usize::from(rank < rem);
        let y_start = cursor;
        let y_end = y_start + local_ny;
        cursor = y_end;
        out.push(DomainSlice {
            rank,
            nranks,
            global_ny,
            local_ny,
            halo,
            y_start,
            y_end,
        });
    }
    Ok(out)
}

/// Copy out the `halo` core rows next to each guard region: (lower, upper).
pub fn pack_halo_rows(local: &Field3D, halo: usize) -> DriftResult<(Field3D, Field3D)> {
    let ny = local.len_of(Axis(1));
    if halo == 0 {
        return Err(DriftError::PhysicsViolation(
            "Halo width must be >= 1".to_string(),
        ));
    }
    if ny < 3 * halo {
        return Err(DriftError::PhysicsViolation(format!(
            "Local block has insufficient poloidal rows {ny} for halo={halo}"
        )));
    }
    let lower = local.slice(s![.., halo..(2 * halo), ..]).to_owned();
    let upper = local.slice(s![.., (ny - 2 * halo)..(ny - halo), ..]).to_owned();
    if lower.iter().any(|v| !v.is_finite()) || upper.iter().any(|v| !v.is_finite()) {
        return Err(DriftError::PhysicsViolation(
            "Packed halo rows contain non-finite values".to_string(),
        ));
    }
    Ok((lower, upper))
}

/// Write received rows into the guard regions. A missing side is filled by
/// repeating the nearest core row.
pub fn apply_halo_rows(
    local: &mut Field3D,
    halo: usize,
    recv_lower: Option<&Field3D>,
    recv_upper: Option<&Field3D>,
) -> DriftResult<()> {
    let (nx, ny, nz) = local.dim();
    if halo == 0 || ny < 3 * halo {
        return Err(DriftError::PhysicsViolation(format!(
            "Local block has insufficient poloidal rows {ny} for halo={halo}"
        )));
    }
    for (name, recv) in [("Lower", recv_lower), ("Upper", recv_upper)] {
        if let Some(r) = recv {
            if r.dim() != (nx, halo, nz) {
                return Err(DriftError::PhysicsViolation(format!(
                    "{name} halo shape mismatch: expected ({nx}, {halo}, {nz}), got {:?}",
                    r.dim()
                )));
            }
            if r.iter().any(|v| !v.is_finite()) {
                return Err(DriftError::PhysicsViolation(format!(
                    "{name} halo contains non-finite values"
                )));
            }
        }
    }

    match recv_lower {
        Some(r) => local.slice_mut(s![.., 0..halo, ..]).assign(r),
        None => {
            let edge = local.index_axis(Axis(1), halo).to_owned();
            for j in 0..halo {
                local.index_axis_mut(Axis(1), j).assign(&edge);
            }
        }
    }
    match recv_upper {
        Some(r) => local.slice_mut(s![.., (ny - halo)..ny, ..]).assign(r),
        None => {
            let edge = local.index_axis(Axis(1), ny - halo - 1).to_owned();
            for j in (ny - halo)..ny {
                local.index_axis_mut(Axis(1), j).assign(&edge);
            }
        }
    }
    Ok(())
}

/// Reassemble the core rows of per-partition fields into one global field.
pub fn stitch_core_rows(locals: &[Field3D], slices: &[DomainSlice]) -> DriftResult<Field3D> {
    if locals.len() != slices.len() || slices.is_empty() {
        return Err(DriftError::PhysicsViolation(format!(
            "locals/slices mismatch: {} vs {}",
            locals.len(),
            slices.len()
        )));
    }
    let (nx, _, nz) = locals[0].dim();
    let global_ny = slices[0].global_ny;
    let mut global = Field3D::zeros((nx, global_ny, nz));
    for (local, sdef) in locals.iter().zip(slices.iter()) {
        let (lnx, lny, lnz) = local.dim();
        if lnx != nx || lnz != nz || lny != sdef.local_ny + 2 * sdef.halo {
            return Err(DriftError::PhysicsViolation(format!(
                "Local block {:?} does not match slice {}",
                local.dim(),
                sdef.rank
            )));
        }
        global
            .slice_mut(s![.., sdef.y_start..sdef.y_end, ..])
            .assign(&local.slice(s![.., sdef.halo..(sdef.halo + sdef.local_ny), ..]));
    }
    Ok(global)
}

/// Field-registration-then-collective-exchange contract.
pub trait Communicator {
    fn slice(&self) -> &DomainSlice;

    /// One collective exchange of all given fields. Returns only after
    /// every partition has reached the same exchange.
    fn exchange(&mut self, fields: &mut [&mut Field3D]) -> DriftResult<()>;

    /// Take part in the pending exchange as a failed partition, so that
    /// every other partition returns an error from it instead of waiting.
    fn abandon_exchange(&mut self, reason: &str);

    /// Replace `data` on every partition with the copy held by `root`.
    fn broadcast(&mut self, data: &mut [f64], root: usize) -> DriftResult<()>;

    /// Enable the twist-shift at the poloidal seam for fields with `nz`
    /// toroidal points spanning `zlength`.
    fn set_twist_shift(&mut self, shift_angle: &[f64], nz: usize, zlength: f64);
}

/// Guard rows for each exchanged field, or the reason the sender aborted.
type HaloMessage = Result<Vec<Field3D>, String>;

#[derive(Debug)]
struct TwistShift {
    angles: Vec<f64>,
    ztrans: ZTransform,
}

impl TwistShift {
    /// Shift every radial line of `rows` in z by ±angle[x].
    fn apply(&self, rows: &mut Field3D, sign: f64) {
        let (nx, ny, _) = rows.dim();
        for ix in 0..nx.min(self.angles.len()) {
            let angle = sign * self.angles[ix];
            for j in 0..ny {
                let line = rows.slice(s![ix, j, ..]).to_vec();
                let shifted = self.ztrans.shift(&line, angle);
                for (dst, v) in rows.slice_mut(s![ix, j, ..]).iter_mut().zip(shifted) {
                    *dst = v;
                }
            }
        }
    }
}

/// In-process communicator: one instance per partition thread, linked to
/// its poloidal neighbours by channels and to all partitions by a barrier.
#[derive(Debug)]
pub struct ChannelComm {
    slice: DomainSlice,
    periodic: bool,
    to_lower: Option<Sender<HaloMessage>>,
    to_upper: Option<Sender<HaloMessage>>,
    from_lower: Option<Receiver<HaloMessage>>,
    from_upper: Option<Receiver<HaloMessage>>,
    barrier: Arc<Barrier>,
    bcast: Arc<Mutex<Vec<f64>>>,
    /// Latest exchange in which some partition failed.
    failed_epoch: Arc<Mutex<u64>>,
    epoch: u64,
    twist: Option<TwistShift>,
}

impl ChannelComm {
    /// Build the communicators of all `nranks` partitions.
    pub fn world(global_ny: usize, nranks: usize, halo: usize, periodic: bool) -> DriftResult<Vec<ChannelComm>> {
        let slices = decompose_y(global_ny, nranks, halo)?;
        let barrier = Arc::new(Barrier::new(nranks));
        let bcast = Arc::new(Mutex::new(Vec::new()));
        let failed_epoch = Arc::new(Mutex::new(0));

        let lower_of = |r: usize| -> Option<usize> {
            if r > 0 {
                Some(r - 1)
            } else if periodic {
                Some(nranks - 1)
            } else {
                None
            }
        };
        let upper_of = |r: usize| -> Option<usize> {
            if r + 1 < nranks {
                Some(r + 1)
            } else if periodic {
                Some(0)
            } else {
                None
            }
        };

        let mut to_lower: Vec<Option<Sender<HaloMessage>>> = (0..nranks).map(|_| None).collect();
        let mut to_upper: Vec<Option<Sender<HaloMessage>>> = (0..nranks).map(|_| None).collect();
        let mut from_lower: Vec<Option<Receiver<HaloMessage>>> = (0..nranks).map(|_| None).collect();
        let mut from_upper: Vec<Option<Receiver<HaloMessage>>> = (0..nranks).map(|_| None).collect();
        for r in 0..nranks {
            if let Some(lo) = lower_of(r) {
                let (tx, rx) = channel();
                to_lower[r] = Some(tx);
                from_upper[lo] = Some(rx);
            }
            if let Some(up) = upper_of(r) {
                let (tx, rx) = channel();
                to_upper[r] = Some(tx);
                from_lower[up] = Some(rx);
            }
        }

        let mut out = Vec::with_capacity(nranks);
        for (r, slice) in slices.into_iter().enumerate() {
            out.push(ChannelComm {
                slice,
                periodic,
                to_lower: to_lower[r].take(),
                to_upper: to_upper[r].take(),
                from_lower: from_lower[r].take(),
                from_upper: from_upper[r].take(),
                barrier: Arc::clone(&barrier),
                bcast: Arc::clone(&bcast),
                failed_epoch: Arc::clone(&failed_epoch),
                epoch: 0,
                twist: None,
            });
        }
        Ok(out)
    }

    /// Whole domain on one partition.
    pub fn single(global_ny: usize, halo: usize, periodic: bool) -> DriftResult<ChannelComm> {
        Self::world(global_ny, 1, halo, periodic)?
            .pop()
            .ok_or_else(|| DriftError::Communication("No partition created".to_string()))
    }

    fn crosses_lower_seam(&self) -> bool {
        self.periodic && self.slice.rank == 0
    }

    fn crosses_upper_seam(&self) -> bool {
        self.periodic && self.slice.rank + 1 == self.slice.nranks
    }

    /// Send to both neighbours, then receive from both. Every send and
    /// receive is issued before any error is reported.
    fn swap(
        &self,
        lower_send: HaloMessage,
        upper_send: HaloMessage,
    ) -> DriftResult<(Option<Vec<Field3D>>, Option<Vec<Field3D>>)> {
        let sent_lower = send_to(self.to_lower.as_ref(), lower_send, "Lower");
        let sent_upper = send_to(self.to_upper.as_ref(), upper_send, "Upper");
        let recv_lower = recv_from(self.from_lower.as_ref(), "Lower");
        let recv_upper = recv_from(self.from_upper.as_ref(), "Upper");
        sent_lower?;
        sent_upper?;
        Ok((recv_lower?, recv_upper?))
    }

    fn apply_received(
        &self,
        fields: &mut [&mut Field3D],
        mut recv_lower: Option<Vec<Field3D>>,
        mut recv_upper: Option<Vec<Field3D>>,
    ) -> DriftResult<()> {
        for recv in [&recv_lower, &recv_upper].into_iter().flatten() {
            if recv.len() != fields.len() {
                return Err(DriftError::Communication(format!(
                    "Halo message carries {} fields, expected {}",
                    recv.len(),
                    fields.len()
                )));
            }
        }

        if let Some(twist) = &self.twist {
            if self.crosses_lower_seam() {
                if let Some(rows) = recv_lower.as_mut() {
                    rows.iter_mut().for_each(|r| twist.apply(r, 1.0));
                }
            }
            if self.crosses_upper_seam() {
                if let Some(rows) = recv_upper.as_mut() {
                    rows.iter_mut().for_each(|r| twist.apply(r, -1.0));
                }
            }
        }

        let halo = self.slice.halo;
        for (i, f) in fields.iter_mut().enumerate() {
            apply_halo_rows(
                f,
                halo,
                recv_lower.as_ref().map(|m| &m[i]),
                recv_upper.as_ref().map(|m| &m[i]),
            )?;
        }
        Ok(())
    }

    /// Collective vote closing an exchange: true when no partition failed.
    fn agree(&mut self, local_ok: bool) -> bool {
        self.epoch += 1;
        if !local_ok {
            let mut last = self.failed_epoch.lock().unwrap_or_else(PoisonError::into_inner);
            *last = (*last).max(self.epoch);
        }
        self.barrier.wait();
        let all_ok = *self.failed_epoch.lock().unwrap_or_else(PoisonError::into_inner) != self.epoch;
        // Nobody may record the next epoch before every vote is read.
        self.barrier.wait();
        all_ok
    }
}

fn send_to(tx: Option<&Sender<HaloMessage>>, msg: HaloMessage, side: &str) -> DriftResult<()> {
    match tx {
        Some(tx) => tx
            .send(msg)
            .map_err(|_| DriftError::Communication(format!("{side} neighbour disconnected"))),
        None => Ok(()),
    }
}

fn recv_from(rx: Option<&Receiver<HaloMessage>>, side: &str) -> DriftResult<Option<Vec<Field3D>>> {
    let Some(rx) = rx else {
        return Ok(None);
    };
    match rx.recv() {
        Ok(Ok(rows)) => Ok(Some(rows)),
        Ok(Err(reason)) => Err(DriftError::Communication(format!(
            "{side} neighbour aborted the halo exchange: {reason}"
        ))),
        Err(_) => Err(DriftError::Communication(format!(
            "{side} neighbour disconnected during halo exchange"
        ))),
    }
}

impl Communicator for ChannelComm {
    fn slice(&self) -> &DomainSlice {
        &self.slice
    }

    fn exchange(&mut self, fields: &mut [&mut Field3D]) -> DriftResult<()> {
        let halo = self.slice.halo;
        let packed = fields
            .iter()
            .map(|f| pack_halo_rows(f, halo))
            .collect::<DriftResult<Vec<_>>>();
        let (lower_send, upper_send, packed) = match packed {
            Ok(pairs) => {
                let (lower, upper): (Vec<Field3D>, Vec<Field3D>) = pairs.into_iter().unzip();
                (Ok(lower), Ok(upper), Ok(()))
            }
            Err(e) => (Err(e.to_string()), Err(e.to_string()), Err(e)),
        };

        let swapped = self.swap(lower_send, upper_send);
        let status = packed
            .and(swapped)
            .and_then(|(lower, upper)| self.apply_received(fields, lower, upper));

        let all_ok = self.agree(status.is_ok());
        status?;
        if !all_ok {
            return Err(DriftError::Communication(
                "Halo exchange failed on another partition".to_string(),
            ));
        }
        Ok(())
    }

    fn abandon_exchange(&mut self, reason: &str) {
        let _ = self.swap(Err(reason.to_string()), Err(reason.to_string()));
        self.agree(false);
    }

    fn broadcast(&mut self, data: &mut [f64], root: usize) -> DriftResult<()> {
        if root >= self.slice.nranks {
            return Err(DriftError::Communication(format!(
                "Broadcast root {root} out of range for {} partitions",
                self.slice.nranks
            )));
        }
        let poisoned = || DriftError::Communication("Broadcast buffer poisoned".to_string());
        if self.slice.rank == root {
            let mut buf = self.bcast.lock().map_err(|_| poisoned())?;
            buf.clear();
            buf.extend_from_slice(data);
        }
        self.barrier.wait();
        let result = if self.slice.rank != root {
            let buf = self.bcast.lock().map_err(|_| poisoned())?;
            if buf.len() == data.len() {
                data.copy_from_slice(&buf);
                Ok(())
            } else {
                Err(DriftError::Communication(format!(
                    "Broadcast length mismatch: root sent {}, expected {}",
                    buf.len(),
                    data.len()
                )))
            }
        } else {
            Ok(())
        };
        // Keep the buffer alive until every reader is done.
        self.barrier.wait();
        result
    }

    fn set_twist_shift(&mut self, shift_angle: &[f64], nz: usize, zlength: f64) {
        self.twist = Some(TwistShift {
            angles: shift_angle.to_vec(),
            ztrans: ZTransform::new(nz, zlength),
        });
    }
}
