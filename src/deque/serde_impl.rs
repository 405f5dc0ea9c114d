//! Serialize a deque as its left-to-right snapshot

use super::Deque;
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use std::vec::Vec;

impl<T> Serialize for Deque<T>
where
    T: Serialize + Clone + Send + 'static,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.to_vec())
    }
}

impl<'de, T> Deserialize<'de> for Deque<T>
where
    T: Deserialize<'de> + Send + 'static,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        Vec::<T>::deserialize(deserializer).map(Deque::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec;

    #[test]
    fn test_sequence_round_trip() {
        let deque: Deque<u32> = vec![1, 2, 3].into();
        deque.push_left(0);

        let json = serde_json::to_string(&deque).unwrap();
        assert_eq!(json, "[0,1,2,3]");

        let restored: Deque<u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.pop_right(), Some(3));
        assert_eq!(restored.to_vec(), vec![0, 1, 2]);
    }
}
