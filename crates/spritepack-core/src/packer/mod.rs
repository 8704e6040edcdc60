//! Multi-sheet rectangle packing.
//!
//! [`pack`] distributes rectangles over as many sheets as needed, each sheet
//! backed by a max-rects bin with best-short-side-fit placement. Growable
//! sheets start near the largest rectangle and double toward the maximum;
//! fixed sheets start at the maximum.

pub mod maxrects;

use crate::error::{Result, SpritePackError};
use crate::geometry::{ceil_to_pot, Rect};
use maxrects::MaxRectsBin;

#[derive(Debug, Clone)]
pub struct PackParams {
    pub power_of_two: bool,
    pub allow_rotate: bool,
    /// Unusable margin inside the sheet perimeter (single side).
    pub border_padding: i32,
    /// Effective maximum sheet width; `i32::MAX` when unbounded.
    pub max_width: i32,
    pub max_height: i32,
    /// True when the sheet may start small and grow toward the maximum.
    pub can_grow: bool,
}

/// A rectangle to place; `w`/`h` are the full packing size including any
/// margins the caller reserved.
#[derive(Debug, Clone, Copy)]
pub struct PackRect {
    pub id: usize,
    pub w: i32,
    pub h: i32,
}

/// One placement; `x`/`y` carry a `2 * border_padding` origin offset which
/// the caller folds away when writing sprite rects back.
#[derive(Debug, Clone, Copy)]
pub struct Placement {
    pub id: usize,
    pub x: i32,
    pub y: i32,
    pub rotated: bool,
}

/// A closed sheet: tight dimensions (border included) and its placements.
#[derive(Debug, Clone)]
pub struct PackedSheet {
    pub width: i32,
    pub height: i32,
    pub placements: Vec<Placement>,
}

fn pot_if(v: i32, power_of_two: bool) -> i32 {
    if power_of_two {
        ceil_to_pot(v)
    } else {
        v
    }
}

fn initial_bin(params: &PackParams, rects: &[PackRect]) -> (i32, i32) {
    if !params.can_grow {
        return (params.max_width, params.max_height);
    }
    let pad = params.border_padding * 2;
    let mut w = 1;
    let mut h = 1;
    for r in rects {
        w = w.max(r.w.saturating_add(pad));
        h = h.max(r.h.saturating_add(pad));
    }
    (
        pot_if(w, params.power_of_two).min(params.max_width),
        pot_if(h, params.power_of_two).min(params.max_height),
    )
}

/// Doubles the smaller growable dimension; returns false when the bin is
/// already at the maximum.
fn grow_bin(params: &PackParams, w: &mut i32, h: &mut i32) -> bool {
    let grow_w = *w < params.max_width;
    let grow_h = *h < params.max_height;
    if !grow_w && !grow_h {
        return false;
    }
    if grow_w && (!grow_h || *w <= *h) {
        *w = pot_if(w.saturating_mul(2), params.power_of_two).min(params.max_width);
    } else {
        *h = pot_if(h.saturating_mul(2), params.power_of_two).min(params.max_height);
    }
    true
}

/// Greedily places `rects` (already in placement order) into a bin of the
/// given size. Returns the placements and the ids left over.
fn fill_sheet(
    params: &PackParams,
    bin_w: i32,
    bin_h: i32,
    rects: &[PackRect],
) -> (Vec<Placement>, Vec<PackRect>) {
    let pad = params.border_padding * 2;
    let area = Rect::new(pad, pad, bin_w - pad, bin_h - pad);
    let mut bin = MaxRectsBin::new(area, params.allow_rotate);
    let mut placements = Vec::new();
    let mut remaining = Vec::new();
    for r in rects {
        match bin.insert(r.w, r.h) {
            Some((rect, rotated)) => placements.push(Placement {
                id: r.id,
                x: rect.x,
                y: rect.y,
                rotated,
            }),
            None => remaining.push(*r),
        }
    }
    (placements, remaining)
}

fn sheet_size(params: &PackParams, rects: &[PackRect], placements: &[Placement]) -> (i32, i32) {
    let mut w = 0;
    let mut h = 0;
    for p in placements {
        let r = rects
            .iter()
            .find(|r| r.id == p.id)
            .expect("placement for unknown rect");
        let (pw, ph) = if p.rotated { (r.h, r.w) } else { (r.w, r.h) };
        // the doubled border origin folds into one border of slack on each
        // side once the caller subtracts border_padding from placements
        w = w.max(p.x + pw);
        h = h.max(p.y + ph);
    }
    (
        pot_if(w.max(1), params.power_of_two),
        pot_if(h.max(1), params.power_of_two),
    )
}

/// Packs `rects` into one or more sheets.
///
/// Rectangles are placed in order of descending longer side, ties broken by
/// descending shorter side. Fails only when an empty, fully grown sheet
/// cannot take the next rectangle.
pub fn pack(params: &PackParams, mut rects: Vec<PackRect>) -> Result<Vec<PackedSheet>> {
    rects.sort_by(|a, b| {
        (b.w.max(b.h), b.w.min(b.h)).cmp(&(a.w.max(a.h), a.w.min(a.h)))
    });

    let mut sheets = Vec::new();
    while !rects.is_empty() {
        let (mut bin_w, mut bin_h) = initial_bin(params, &rects);
        let (placements, remaining) = loop {
            let (placements, remaining) = fill_sheet(params, bin_w, bin_h, &rects);
            if remaining.is_empty() {
                break (placements, remaining);
            }
            // grow and repack the sheet from scratch so the free list stays
            // consistent with the larger bin
            if !grow_bin(params, &mut bin_w, &mut bin_h) {
                break (placements, remaining);
            }
        };
        if placements.is_empty() {
            let r = &rects[0];
            return Err(SpritePackError::Internal(format!(
                "rectangle {}x{} does not fit an empty {}x{} sheet",
                r.w, r.h, bin_w, bin_h
            )));
        }
        let (width, height) = sheet_size(params, &rects, &placements);
        sheets.push(PackedSheet {
            width,
            height,
            placements,
        });
        rects = remaining;
    }
    Ok(sheets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(max_w: i32, max_h: i32, can_grow: bool) -> PackParams {
        PackParams {
            power_of_two: false,
            allow_rotate: false,
            border_padding: 0,
            max_width: max_w,
            max_height: max_h,
            can_grow,
        }
    }

    fn rects(sizes: &[(i32, i32)]) -> Vec<PackRect> {
        sizes
            .iter()
            .enumerate()
            .map(|(id, &(w, h))| PackRect { id, w, h })
            .collect()
    }

    #[test]
    fn single_row_grows_sideways() {
        // bounded height forces pure horizontal growth
        let p = params(i32::MAX, 16, true);
        let sheets = pack(&p, rects(&[(16, 16); 31])).unwrap();
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].width, 496);
        assert_eq!(sheets[0].height, 16);
    }

    #[test]
    fn overflow_opens_new_sheet() {
        let p = params(32, 32, false);
        let sheets = pack(&p, rects(&[(32, 32), (32, 32), (16, 16)])).unwrap();
        assert_eq!(sheets.len(), 3);
        for s in &sheets {
            assert_eq!(s.placements.len(), 1);
        }
    }

    #[test]
    fn rotation_fits_tall_rect_in_wide_bin() {
        let p = PackParams {
            allow_rotate: true,
            ..params(64, 16, false)
        };
        let sheets = pack(&p, rects(&[(10, 60)])).unwrap();
        assert_eq!(sheets.len(), 1);
        assert!(sheets[0].placements[0].rotated);
    }

    #[test]
    fn too_large_rect_is_an_error() {
        let p = params(16, 16, false);
        assert!(pack(&p, rects(&[(20, 20)])).is_err());
    }

    #[test]
    fn placements_disjoint_and_in_bounds() {
        let p = params(64, 64, false);
        let sizes: Vec<(i32, i32)> = (0..20).map(|i| (4 + i % 13, 4 + (i * 7) % 11)).collect();
        let input = rects(&sizes);
        let sheets = pack(&p, input.clone()).unwrap();
        for sheet in &sheets {
            for (i, a) in sheet.placements.iter().enumerate() {
                let ra = &input[a.id];
                let (aw, ah) = if a.rotated { (ra.h, ra.w) } else { (ra.w, ra.h) };
                assert!(a.x >= 0 && a.y >= 0);
                assert!(a.x + aw <= 64 && a.y + ah <= 64);
                for b in sheet.placements.iter().skip(i + 1) {
                    let rb = &input[b.id];
                    let (bw, bh) = if b.rotated { (rb.h, rb.w) } else { (rb.w, rb.h) };
                    let overlap = a.x < b.x + bw
                        && b.x < a.x + aw
                        && a.y < b.y + bh
                        && b.y < a.y + ah;
                    assert!(!overlap, "placements {} and {} overlap", a.id, b.id);
                }
            }
        }
    }

    #[test]
    fn power_of_two_growth() {
        let p = PackParams {
            power_of_two: true,
            ..params(i32::MAX, i32::MAX, true)
        };
        let sheets = pack(&p, rects(&[(20, 20), (20, 20)])).unwrap();
        assert_eq!(sheets.len(), 1);
        assert!(sheets[0].width.count_ones() == 1);
        assert!(sheets[0].height.count_ones() == 1);
    }
}
