// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use serde::{Deserialize, Serialize};
use std::{borrow::Borrow, fmt::Display};

#[repr(transparent)]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrainId(String);

impl TrainId {
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        TrainId(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TrainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrainId {
    fn from(value: &str) -> Self {
        TrainId(value.to_owned())
    }
}

impl From<String> for TrainId {
    fn from(value: String) -> Self {
        TrainId(value)
    }
}

impl Borrow<str> for TrainId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[repr(transparent)]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BayId(String);

impl BayId {
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        BayId(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for BayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BayId {
    fn from(value: &str) -> Self {
        BayId(value.to_owned())
    }
}

impl From<String> for BayId {
    fn from(value: String) -> Self {
        BayId(value)
    }
}

impl Borrow<str> for BayId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[repr(transparent)]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(String);

impl PlanId {
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        PlanId(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_ids_display_raw_value() {
        assert_eq!(TrainId::new("T01").to_string(), "T01");
        assert_eq!(BayId::from("A1").to_string(), "A1");
        assert_eq!(PlanId::new("DAILY_2025-01-01").as_str(), "DAILY_2025-01-01");
    }

    #[test]
    fn test_train_ids_order_lexicographically() {
        let mut ids = vec![TrainId::from("T10"), TrainId::from("T02"), TrainId::from("T01")];
        ids.sort();
        assert_eq!(ids, vec!["T01".into(), "T02".into(), TrainId::from("T10")]);
    }

    #[test]
    fn test_ids_borrow_as_str_for_map_lookup() {
        let mut m: BTreeMap<BayId, u32> = BTreeMap::new();
        m.insert(BayId::from("B2"), 5);
        assert_eq!(m.get("B2"), Some(&5));
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&TrainId::from("T07")).unwrap();
        assert_eq!(json, "\"T07\"");
    }
}
