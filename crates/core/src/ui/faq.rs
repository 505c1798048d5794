/// Expanded flags of an FAQ list. Items toggle independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaqAccordion {
    expanded: Vec<bool>,
}

/// Render state of one item: `aria_expanded` mirrors panel visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaqItemState {
    pub index: usize,
    pub expanded: bool,
}

impl FaqItemState {
    pub fn aria_expanded(&self) -> &'static str {
        if self.expanded {
            "true"
        } else {
            "false"
        }
    }

    pub fn hidden(&self) -> bool {
        !self.expanded
    }
}

impl FaqAccordion {
    pub fn new(len: usize) -> Self {
        Self {
            expanded: vec![false; len],
        }
    }

    /// Open the listed items, ignoring out-of-range indices.
    pub fn with_open(len: usize, open: impl IntoIterator<Item = usize>) -> Self {
        let mut acc = Self::new(len);
        for i in open {
            if let Some(flag) = acc.expanded.get_mut(i) {
                *flag = true;
            }
        }
        acc
    }

    /// Parse a `?faq=0,2` parameter.
    pub fn from_param(len: usize, param: Option<&str>) -> Self {
        let open = param
            .unwrap_or_default()
            .split(',')
            .filter_map(|s| s.trim().parse::<usize>().ok());
        Self::with_open(len, open)
    }

    pub fn toggle(&mut self, index: usize) -> bool {
        match self.expanded.get_mut(index) {
            Some(flag) => {
                *flag = !*flag;
                true
            }
            None => false,
        }
    }

    pub fn is_expanded(&self, index: usize) -> bool {
        self.expanded.get(index).copied().unwrap_or(false)
    }

    pub fn items(&self) -> impl Iterator<Item = FaqItemState> + '_ {
        self.expanded
            .iter()
            .enumerate()
            .map(|(index, &expanded)| FaqItemState { index, expanded })
    }

    /// The `?faq=` value after toggling `index`, for no-script links.
    pub fn param_after_toggle(&self, index: usize) -> String {
        let mut next = self.clone();
        next.toggle(index);
        next.items()
            .filter(|i| i.expanded)
            .map(|i| i.index.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}
