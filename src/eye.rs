//! Left/right eye identifiers and a small per-eye container

use std::ops::{Index, IndexMut};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    pub const BOTH: [Eye; 2] = [Eye::Left, Eye::Right];

    /// -1 for the left eye, +1 for the right eye (along the HMD's local right axis)
    pub fn sign(self) -> f64 {
        match self {
            Eye::Left => -1.0,
            Eye::Right => 1.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Eye::Left => "left",
            Eye::Right => "right",
        }
    }
}

/// One value per eye
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EyePair<T> {
    pub left: T,
    pub right: T,
}

impl<T> EyePair<T> {
    pub fn new(left: T, right: T) -> Self {
        Self { left, right }
    }

    /// Build both entries from a per-eye function
    pub fn from_fn(mut f: impl FnMut(Eye) -> T) -> Self {
        let left = f(Eye::Left);
        let right = f(Eye::Right);
        Self { left, right }
    }

    pub fn map<U>(self, mut f: impl FnMut(Eye, T) -> U) -> EyePair<U> {
        EyePair {
            left: f(Eye::Left, self.left),
            right: f(Eye::Right, self.right),
        }
    }

    /// Like `from_fn` but stops at the first error
    pub fn try_from_fn<E>(mut f: impl FnMut(Eye) -> Result<T, E>) -> Result<Self, E> {
        let left = f(Eye::Left)?;
        let right = f(Eye::Right)?;
        Ok(Self { left, right })
    }
}

impl<T> Index<Eye> for EyePair<T> {
    type Output = T;

    fn index(&self, eye: Eye) -> &T {
        match eye {
            Eye::Left => &self.left,
            Eye::Right => &self.right,
        }
    }
}

impl<T> IndexMut<Eye> for EyePair<T> {
    fn index_mut(&mut self, eye: Eye) -> &mut T {
        match eye {
            Eye::Left => &mut self.left,
            Eye::Right => &mut self.right,
        }
    }
}
