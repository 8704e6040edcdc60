use crate::geometry::Rect;

/// Max-rects free list over a single bin, best-short-side-fit placement.
///
/// The free list is kept as a disjoint-union cover of the bin minus all
/// placed rectangles: placing a node splits every intersecting free rect
/// into up to four remainders, then contained rects are pruned.
pub struct MaxRectsBin {
    free: Vec<Rect>,
    allow_rotate: bool,
}

impl MaxRectsBin {
    pub fn new(area: Rect, allow_rotate: bool) -> Self {
        Self {
            free: if area.is_empty() { Vec::new() } else { vec![area] },
            allow_rotate,
        }
    }

    /// Places a `w x h` rectangle, possibly rotated. Returns the placed rect
    /// (post-rotation dimensions) and whether it was rotated.
    pub fn insert(&mut self, w: i32, h: i32) -> Option<(Rect, bool)> {
        let (node, rotated) = self.find_position(w, h)?;
        self.place(&node);
        Some((node, rotated))
    }

    /// Score of fitting `w x h` into `fr`: the shorter leftover side, then
    /// the longer one. Lower is better.
    fn score(fr: &Rect, w: i32, h: i32) -> (i32, i32) {
        let leftover_h = fr.w - w;
        let leftover_v = fr.h - h;
        (leftover_h.min(leftover_v), leftover_h.max(leftover_v))
    }

    fn find_position(&self, w: i32, h: i32) -> Option<(Rect, bool)> {
        let mut best: Option<(Rect, bool)> = None;
        let mut best_score = (i32::MAX, i32::MAX);
        let mut best_pos = (i32::MAX, i32::MAX);
        for fr in &self.free {
            for (cw, ch, rotated) in [(w, h, false), (h, w, true)] {
                if rotated && (!self.allow_rotate || w == h) {
                    continue;
                }
                if fr.w < cw || fr.h < ch {
                    continue;
                }
                let score = Self::score(fr, cw, ch);
                if score < best_score || (score == best_score && (fr.y, fr.x) < best_pos) {
                    best = Some((Rect::new(fr.x, fr.y, cw, ch), rotated));
                    best_score = score;
                    best_pos = (fr.y, fr.x);
                }
            }
        }
        best
    }

    fn place(&mut self, node: &Rect) {
        let mut new_free: Vec<Rect> = Vec::with_capacity(self.free.len() + 4);
        for fr in self.free.iter() {
            if !fr.intersects(node) {
                new_free.push(*fr);
                continue;
            }
            let ix1 = fr.x.max(node.x);
            let iy1 = fr.y.max(node.y);
            let ix2 = fr.right().min(node.right());
            let iy2 = fr.bottom().min(node.bottom());

            // above
            if iy1 > fr.y {
                new_free.push(Rect::new(fr.x, fr.y, fr.w, iy1 - fr.y));
            }
            // below
            if iy2 < fr.bottom() {
                new_free.push(Rect::new(fr.x, iy2, fr.w, fr.bottom() - iy2));
            }
            // left strip within the overlap band
            if ix1 > fr.x && iy2 > iy1 {
                new_free.push(Rect::new(fr.x, iy1, ix1 - fr.x, iy2 - iy1));
            }
            // right strip within the overlap band
            if ix2 < fr.right() && iy2 > iy1 {
                new_free.push(Rect::new(ix2, iy1, fr.right() - ix2, iy2 - iy1));
            }
        }
        self.free = new_free;
        self.prune();
    }

    /// Removes free rects fully contained in another.
    fn prune(&mut self) {
        let mut i = 0;
        while i < self.free.len() {
            let a = self.free[i];
            let mut remove_i = false;
            let mut j = i + 1;
            while j < self.free.len() {
                let b = self.free[j];
                if b.contains_rect(&a) {
                    remove_i = true;
                    break;
                }
                if a.contains_rect(&b) {
                    self.free.remove(j);
                    continue;
                }
                j += 1;
            }
            if remove_i {
                self.free.remove(i);
            } else {
                i += 1;
            }
        }
    }

    #[cfg(test)]
    fn free_list(&self) -> &[Rect] {
        &self.free
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_fit_consumes_bin() {
        let mut bin = MaxRectsBin::new(Rect::new(0, 0, 16, 16), false);
        let (r, rot) = bin.insert(16, 16).unwrap();
        assert_eq!(r, Rect::new(0, 0, 16, 16));
        assert!(!rot);
        assert!(bin.insert(1, 1).is_none());
    }

    #[test]
    fn short_side_fit_prefers_snug_rect() {
        // two free rects after an initial split; the snugger one must win
        let mut bin = MaxRectsBin::new(Rect::new(0, 0, 32, 32), false);
        bin.insert(32, 20).unwrap();
        // remaining free space is 32x12 at y=20; an 8x12 rect fits snugly
        let (r, _) = bin.insert(8, 12).unwrap();
        assert_eq!((r.y, r.h), (20, 12));
    }

    #[test]
    fn rotation_considered() {
        let mut bin = MaxRectsBin::new(Rect::new(0, 0, 30, 10), true);
        let (r, rot) = bin.insert(8, 24).unwrap();
        assert!(rot);
        assert_eq!((r.w, r.h), (24, 8));
    }

    #[test]
    fn free_list_stays_disjoint() {
        let mut bin = MaxRectsBin::new(Rect::new(0, 0, 64, 64), false);
        for (w, h) in [(20, 12), (9, 33), (17, 5), (11, 11), (30, 7)] {
            bin.insert(w, h).unwrap();
        }
        let free = bin.free_list();
        for i in 0..free.len() {
            for j in i + 1..free.len() {
                assert!(
                    !free[i].intersects(&free[j]),
                    "free rects {:?} and {:?} overlap",
                    free[i],
                    free[j]
                );
            }
        }
    }

    #[test]
    fn placement_is_deterministic() {
        let mut bin = MaxRectsBin::new(Rect::new(0, 0, 40, 40), false);
        // split the bin into two equal-score candidates
        bin.insert(40, 20).unwrap();
        let (r, _) = bin.insert(10, 10).unwrap();
        assert_eq!((r.x, r.y), (0, 20));
    }
}
