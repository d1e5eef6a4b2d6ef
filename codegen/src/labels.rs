use bytecode::Label;

/// Hands out jump targets for one compilation run. Labels are never
/// reused, so every one issued is distinct.
#[derive(Debug, Default)]
pub struct LabelAllocator {
    next: u32,
}

impl LabelAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self) -> Label {
        let label = Label::new(self.next);
        self.next += 1;
        log::trace!("issued {label}");
        label
    }

    /// Number of labels issued so far.
    pub fn issued(&self) -> u32 {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_sequential_and_distinct() {
        let mut labels = LabelAllocator::new();
        let issued: Vec<_> = (0..4).map(|_| labels.fresh()).collect();
        assert_eq!(
            issued,
            vec![Label::new(0), Label::new(1), Label::new(2), Label::new(3)]
        );
        assert_eq!(labels.issued(), 4);
        assert_eq!(issued[2].to_string(), "Label_2");
    }

    #[test]
    fn independent_runs_do_not_interfere() {
        let mut a = LabelAllocator::new();
        let mut b = LabelAllocator::new();
        a.fresh();
        a.fresh();
        assert_eq!(b.fresh(), Label::new(0));
    }
}
