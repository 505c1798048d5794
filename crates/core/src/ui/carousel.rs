/// Selected slide of a carousel or gallery.
///
/// Navigation wraps modulo the item count. An empty carousel stays at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Carousel {
    len: usize,
    selected: usize,
}

impl Carousel {
    pub fn new(len: usize) -> Self {
        Self { len, selected: 0 }
    }

    /// Start at `index`, which may be out of range or negative
    /// (from a `?foto=` parameter).
    pub fn starting_at(len: usize, index: i64) -> Self {
        let mut c = Self::new(len);
        c.select(index);
        c
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn next(&mut self) {
        if self.len > 0 {
            self.selected = (self.selected + 1) % self.len;
        }
    }

    pub fn prev(&mut self) {
        if self.len > 0 {
            self.selected = (self.selected + self.len - 1) % self.len;
        }
    }

    pub fn select(&mut self, index: i64) {
        if self.len > 0 {
            self.selected = index.rem_euclid(self.len as i64) as usize;
        }
    }

    /// Autoplay step: advances unless the pointer is over the carousel.
    pub fn tick(&mut self, hovering: bool) {
        if !hovering {
            self.next();
        }
    }

    pub fn next_index(&self) -> usize {
        let mut c = *self;
        c.next();
        c.selected
    }

    pub fn prev_index(&self) -> usize {
        let mut c = *self;
        c.prev();
        c.selected
    }
}
