/// Tracks which section is on screen.
///
/// Navigation is free: any section can be visited regardless of completion,
/// and out-of-range moves are ignored rather than reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionNavigator {
    current: usize,
    len: usize,
}

impl SectionNavigator {
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self { current: 0, len }
    }

    #[must_use]
    pub fn current(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.current + 1 >= self.len
    }

    /// Moves forward one section. Returns `false` at the last section.
    pub fn next(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.current += 1;
        true
    }

    /// Moves back one section. Returns `false` at the first section.
    pub fn previous(&mut self) -> bool {
        if self.is_first() {
            return false;
        }
        self.current -= 1;
        true
    }

    /// Jumps to `index`. Indices outside `0..len` leave the position alone.
    pub fn go_to(&mut self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        self.current = index;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_and_previous_stop_at_the_ends() {
        let mut nav = SectionNavigator::new(3);
        assert!(!nav.previous());
        assert_eq!(nav.current(), 0);

        assert!(nav.next());
        assert!(nav.next());
        assert!(nav.is_last());
        assert!(!nav.next());
        assert_eq!(nav.current(), 2);

        assert!(nav.previous());
        assert_eq!(nav.current(), 1);
    }

    #[test]
    fn go_to_ignores_out_of_range() {
        let mut nav = SectionNavigator::new(4);
        assert!(nav.go_to(3));
        assert!(!nav.go_to(4));
        assert!(!nav.go_to(usize::MAX));
        assert_eq!(nav.current(), 3);

        assert!(nav.go_to(0));
        assert!(nav.is_first());
    }

    #[test]
    fn empty_navigator_never_moves() {
        let mut nav = SectionNavigator::new(0);
        assert!(nav.is_empty());
        assert!(!nav.next());
        assert!(!nav.previous());
        assert!(!nav.go_to(0));
        assert_eq!(nav.current(), 0);
    }
}
