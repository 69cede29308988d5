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

use crate::{err::BayConfigurationError, id::BayId};
use rail_alloc_core::position::{BayPosition, ShuntingSteps};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt::Display};

/// Tier of a physical stabling bay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BayType {
    /// Bays with direct access to the departure road.
    Primary,
    Standby,
    Overflow,
}

impl Display for BayType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BayType::Primary => write!(f, "PRIMARY"),
            BayType::Standby => write!(f, "STANDBY"),
            BayType::Overflow => write!(f, "OVERFLOW"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BayDefinition {
    id: BayId,
    bay_type: BayType,
    position: u32,
}

impl BayDefinition {
    #[inline]
    pub fn new(id: impl Into<BayId>, bay_type: BayType, position: u32) -> Self {
        Self {
            id: id.into(),
            bay_type,
            position,
        }
    }

    #[inline]
    pub fn id(&self) -> &BayId {
        &self.id
    }

    #[inline]
    pub fn bay_type(&self) -> BayType {
        self.bay_type
    }

    #[inline]
    pub fn position(&self) -> BayPosition {
        BayPosition::new(self.position)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawBayConfiguration {
    bays: Vec<BayDefinition>,
    #[serde(default)]
    max_shunting_distance: Option<u32>,
}

/// The fixed set of bays a plan is laid out on.
///
/// Bays keep their configured order within each tier; that order decides which
/// bay a train lands in when a forecast is generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBayConfiguration")]
pub struct BayConfiguration {
    bays: Vec<BayDefinition>,
    max_shunting_distance: Option<u32>,
    #[serde(skip)]
    index: HashMap<BayId, usize>,
}

impl TryFrom<RawBayConfiguration> for BayConfiguration {
    type Error = BayConfigurationError;

    fn try_from(raw: RawBayConfiguration) -> Result<Self, Self::Error> {
        let cfg = BayConfiguration::new(raw.bays)?;
        Ok(match raw.max_shunting_distance {
            Some(d) => cfg.with_max_shunting_distance(ShuntingSteps::new(d)),
            None => cfg,
        })
    }
}

impl Default for BayConfiguration {
    /// Three roads A, B and C with three bays each: bay 1 is primary, bay 2
    /// standby, bay 3 overflow. Positions run 1..=9 from A1 to C3.
    fn default() -> Self {
        let mut bays = Vec::with_capacity(9);
        for (tier_idx, bay_type) in [BayType::Primary, BayType::Standby, BayType::Overflow]
            .into_iter()
            .enumerate()
        {
            for (road_idx, road) in ["A", "B", "C"].into_iter().enumerate() {
                let slot = tier_idx as u32 + 1;
                let position = road_idx as u32 * 3 + slot;
                bays.push(BayDefinition::new(format!("{road}{slot}"), bay_type, position));
            }
        }
        let index = bays
            .iter()
            .enumerate()
            .map(|(i, b)| (b.id.clone(), i))
            .collect();
        Self {
            bays,
            max_shunting_distance: None,
            index,
        }
    }
}

impl BayConfiguration {
    pub fn new(bays: Vec<BayDefinition>) -> Result<Self, BayConfigurationError> {
        let mut index = HashMap::with_capacity(bays.len());
        let mut by_position: HashMap<BayPosition, BayId> = HashMap::with_capacity(bays.len());
        for (i, bay) in bays.iter().enumerate() {
            if index.insert(bay.id.clone(), i).is_some() {
                return Err(BayConfigurationError::DuplicateBayId(bay.id.clone()));
            }
            if let Some(first) = by_position.insert(bay.position(), bay.id.clone()) {
                return Err(BayConfigurationError::DuplicatePosition {
                    position: bay.position(),
                    first,
                    second: bay.id.clone(),
                });
            }
        }
        Ok(Self {
            bays,
            max_shunting_distance: None,
            index,
        })
    }

    /// Replacement candidates further away than `max` are ignored.
    pub fn with_max_shunting_distance(mut self, max: ShuntingSteps) -> Self {
        self.max_shunting_distance = Some(max.value());
        self
    }

    #[inline]
    pub fn max_shunting_distance(&self) -> Option<ShuntingSteps> {
        self.max_shunting_distance.map(ShuntingSteps::new)
    }

    #[inline]
    pub fn bays(&self) -> &[BayDefinition] {
        &self.bays
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bays.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bays.is_empty()
    }

    /// Bays of one tier in configured order.
    pub fn iter_tier(&self, bay_type: BayType) -> impl Iterator<Item = &BayDefinition> {
        self.bays.iter().filter(move |b| b.bay_type == bay_type)
    }

    #[inline]
    pub fn get(&self, id: &BayId) -> Option<&BayDefinition> {
        self.index.get(id).map(|&i| &self.bays[i])
    }

    #[inline]
    pub fn position_of(&self, id: &BayId) -> Option<BayPosition> {
        self.get(id).map(BayDefinition::position)
    }

    /// Steps needed to move a train between two bays. Bays missing from the
    /// layout are treated as sitting at position zero.
    pub fn shunting_steps(&self, from: &BayId, to: &BayId) -> ShuntingSteps {
        let from = self.position_of(from).unwrap_or_default();
        let to = self.position_of(to).unwrap_or_default();
        from - to
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let cfg = BayConfiguration::default();
        assert_eq!(cfg.len(), 9);
        let primary: Vec<_> = cfg
            .iter_tier(BayType::Primary)
            .map(|b| b.id().as_str())
            .collect();
        assert_eq!(primary, vec!["A1", "B1", "C1"]);
        let overflow: Vec<_> = cfg
            .iter_tier(BayType::Overflow)
            .map(|b| b.id().as_str())
            .collect();
        assert_eq!(overflow, vec!["A3", "B3", "C3"]);
        assert_eq!(cfg.position_of(&"A1".into()), Some(BayPosition::new(1)));
        assert_eq!(cfg.position_of(&"B2".into()), Some(BayPosition::new(5)));
        assert_eq!(cfg.position_of(&"C3".into()), Some(BayPosition::new(9)));
    }

    #[test]
    fn test_shunting_steps_between_bays() {
        let cfg = BayConfiguration::default();
        assert_eq!(
            cfg.shunting_steps(&"A1".into(), &"A2".into()),
            ShuntingSteps::new(1)
        );
        assert_eq!(
            cfg.shunting_steps(&"C3".into(), &"A1".into()),
            ShuntingSteps::new(8)
        );
        assert_eq!(
            cfg.shunting_steps(&"Z9".into(), &"B1".into()),
            ShuntingSteps::new(4)
        );
    }

    #[test]
    fn test_duplicate_bay_id_rejected() {
        let err = BayConfiguration::new(vec![
            BayDefinition::new("A1", BayType::Primary, 1),
            BayDefinition::new("A1", BayType::Standby, 2),
        ])
        .unwrap_err();
        assert_eq!(err, BayConfigurationError::DuplicateBayId("A1".into()));
    }

    #[test]
    fn test_duplicate_position_rejected() {
        let err = BayConfiguration::new(vec![
            BayDefinition::new("A1", BayType::Primary, 1),
            BayDefinition::new("B1", BayType::Primary, 1),
        ])
        .unwrap_err();
        assert!(matches!(err, BayConfigurationError::DuplicatePosition { .. }));
    }

    #[test]
    fn test_deserialize_validates_and_rebuilds_index() {
        let json = r#"{
            "bays": [
                { "id": "P1", "bay_type": "PRIMARY", "position": 1 },
                { "id": "S1", "bay_type": "STANDBY", "position": 4 }
            ],
            "max_shunting_distance": 2
        }"#;
        let cfg: BayConfiguration = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.position_of(&"S1".into()), Some(BayPosition::new(4)));
        assert_eq!(cfg.max_shunting_distance(), Some(ShuntingSteps::new(2)));

        let dup = r#"{ "bays": [
            { "id": "P1", "bay_type": "PRIMARY", "position": 1 },
            { "id": "P1", "bay_type": "STANDBY", "position": 2 }
        ] }"#;
        assert!(serde_json::from_str::<BayConfiguration>(dup).is_err());
    }
}
