use std::fmt;

/// A simple type for integer position windows
///
/// All ranges follow the bed file range convention: half-closed, [start,end)
///
/// SV positions in this crate are 1-indexed VCF positions, so a range is only ever compared
/// against other positions from the same coordinate system.
///
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct IntRange {
    pub start: i64,
    pub end: i64,
}

impl IntRange {
    pub fn from_pair(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Create the window of positions within `radius` of `center`, inclusive at both ends
    ///
    /// # Example
    ///
    /// from_window(100, 20) -> [80,121)
    ///
    pub fn from_window(center: i64, radius: i64) -> Self {
        Self::from_pair(center - radius, center + radius + 1)
    }

    /// Return true if pos intersects range (adjacency does not count)
    ///
    pub fn intersect_pos(&self, pos: i64) -> bool {
        pos >= self.start && pos < self.end
    }
}

impl fmt::Debug for IntRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}-{})", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_window() {
        let r = IntRange::from_window(100, 20);
        assert_eq!(r, IntRange::from_pair(80, 121));
        assert_eq!(format!("{r:?}"), "[80-121)");
    }

    #[test]
    fn test_intersect_pos() {
        let r = IntRange::from_window(1000, 20);
        assert!(r.intersect_pos(980));
        assert!(r.intersect_pos(1020));
        assert!(!r.intersect_pos(979));
        assert!(!r.intersect_pos(1021));

        let r = IntRange::from_window(5, 0);
        assert!(r.intersect_pos(5));
        assert!(!r.intersect_pos(6));
    }
}
