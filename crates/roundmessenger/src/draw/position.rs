// Adjudicator position derived from an index into the combined judge list.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JudgePosition {
    Chair,
    Panellist,
    Trainee,
}

impl JudgePosition {
    /// Position of the judge at `index` in `[chair, panellists.., trainees..]`.
    ///
    /// Anything past `panellist_count` is a trainee. With no panellists this
    /// makes index 1 a trainee straight away.
    pub fn from_index(index: usize, panellist_count: usize) -> Self {
        if index == 0 {
            JudgePosition::Chair
        } else if index > panellist_count {
            JudgePosition::Trainee
        } else {
            JudgePosition::Panellist
        }
    }

    /// Phrase used in the message body.
    pub fn label(&self) -> &'static str {
        match self {
            JudgePosition::Chair => "the chair",
            JudgePosition::Panellist => "a panellist",
            JudgePosition::Trainee => "a trainee",
        }
    }
}

impl fmt::Display for JudgePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_zero_is_always_chair() {
        for n in 0..5 {
            assert_eq!(JudgePosition::from_index(0, n), JudgePosition::Chair);
        }
    }

    #[test]
    fn panellists_fill_one_through_count() {
        for n in 1..5 {
            for j in 1..=n {
                assert_eq!(JudgePosition::from_index(j, n), JudgePosition::Panellist, "j={j} n={n}");
            }
        }
    }

    #[test]
    fn boundary_at_count_and_count_plus_one() {
        let n = 2;
        assert_eq!(JudgePosition::from_index(n, n), JudgePosition::Panellist);
        assert_eq!(JudgePosition::from_index(n + 1, n), JudgePosition::Trainee);
        assert_eq!(JudgePosition::from_index(n + 5, n), JudgePosition::Trainee);
    }

    #[test]
    fn no_panellists_means_index_one_is_trainee() {
        assert_eq!(JudgePosition::from_index(1, 0), JudgePosition::Trainee);
        assert_eq!(JudgePosition::from_index(2, 0), JudgePosition::Trainee);
    }

    #[test]
    fn labels() {
        assert_eq!(JudgePosition::Chair.label(), "the chair");
        assert_eq!(JudgePosition::Panellist.to_string(), "a panellist");
        assert_eq!(JudgePosition::Trainee.to_string(), "a trainee");
    }
}
