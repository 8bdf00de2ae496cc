use arrayvec::ArrayVec;

pub const INNER_SIZE: usize = 1024;
const CUTOFF: usize = INNER_SIZE / 2;

#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub struct Vertebra<T>
where
    T: Clone + Ord,
{
    pub inner: ArrayVec<T, INNER_SIZE>,
    pub max: Option<T>,
}

impl<T: Clone + Ord> Vertebra<T> {
    pub fn new() -> Self {
        return Self {
            inner: ArrayVec::<T, INNER_SIZE>::new(),
            max: None,
        };
    }
    pub fn get(&self, index: usize) -> Option<&T> {
        return self.inner.get(index);
    }
    pub fn insert(&mut self, value: T) -> Result<bool, arrayvec::CapacityError<T>> {
        let mut added = false;
        let idx = self.inner.partition_point(|item| item.clone() < value);
        if let Some(value_at_idx) = self.inner.get(idx) {
            if *value_at_idx != value {
                let insert = self.inner.try_insert(idx, value.clone());
                if let Err(err) = insert {
                    return Err(err);
                }
                added = true;
            }
        } else {
            if let Err(err) = self.inner.try_push(value.clone()) {
                return Err(err);
            }
            added = true;
        }
        if let Some(max) = &self.max {
            if value > max.clone() {
                self.max = Some(value)
            }
        } else {
            self.max = Some(value)
        }
        return Ok(added);
    }
    pub fn remove(&mut self, value: &T) -> bool {
        let idx = self.inner.partition_point(|item| item < value);
        if self.inner.get(idx) != Some(value) {
            return false;
        }
        self.inner.remove(idx);
        self.max = self.inner.last().cloned();
        true
    }
    pub fn halve(&mut self) -> Self {
        let mut latter_half = Self::new();
        let mut idx = 0;
        self.inner.retain(|item| {
            if idx >= CUTOFF {
                latter_half.insert(item.clone()).unwrap();
            }
            let current_idx = idx.clone();
            idx += 1;
            current_idx < CUTOFF
        });
        self.max = self.inner.get(self.inner.len() - 1).cloned();
        return latter_half;
    }
    pub fn len(&self) -> usize {
        return self.inner.len();
    }
}
