use std::hash::BuildHasherDefault;

/// Insertion-ordered map backed by `ahash`, for the spots where lookups are
/// frequent but order still matters (e.g. alias reservation bookkeeping).
pub type IndexMap<K, V> = indexmap::IndexMap<K, V, BuildHasherDefault<ahash::AHasher>>;
pub type IndexSet<V> = indexmap::IndexSet<V, BuildHasherDefault<ahash::AHasher>>;

/// A small builder-closure helper: `Thing::default().config(|t| t.x = 1)`.
pub trait Config: Sized {
    fn config(mut self, f: impl FnOnce(&mut Self)) -> Self {
        f(&mut self);
        self
    }
}

impl<T> Config for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn config_applies_closure() {
        let p = Point::default().config(|p| {
            p.x = 3;
            p.y = 4;
        });
        assert_eq!((p.x, p.y), (3, 4));
    }
}
