use std::fmt;

use worldread_nbt::{AccessError, Compound};

const AIR_NAMES: [&str; 3] = ["minecraft:air", "minecraft:cave_air", "minecraft:void_air"];

/// A palette entry: a namespaced block name plus its state properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockState {
    pub name: String,
    /// In the order they were stored.
    pub properties: Vec<(String, String)>,
}

impl BlockState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    pub fn air() -> Self {
        Self::new(AIR_NAMES[0])
    }

    /// Reads `{Name, Properties?}`. Non-string property values are skipped.
    pub fn from_compound(c: &Compound) -> Result<Self, AccessError> {
        let name = c.get_as::<&str>("Name")?.to_owned();
        let properties = match c.find_as::<&Compound>("Properties")? {
            Some(props) => props
                .iter()
                .filter_map(|(k, v)| Some((k.to_owned(), v.as_str()?.to_owned())))
                .collect(),
            None => Vec::new(),
        };
        Ok(Self { name, properties })
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_air(&self) -> bool {
        AIR_NAMES.contains(&self.name.as_str())
    }
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.properties.is_empty() {
            f.write_str("[")?;
            for (i, (k, v)) in self.properties.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{k}={v}")?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}

/// The block at one position, in the vocabulary of the chunk's era.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block<'a> {
    /// Numeric id and 4-bit data value (pre-1.13 saves).
    Legacy { id: u16, data: u8 },
    State(&'a BlockState),
}

impl Block<'_> {
    pub fn is_air(&self) -> bool {
        match self {
            Block::Legacy { id, .. } => *id == 0,
            Block::State(state) => state.is_air(),
        }
    }

    pub fn id(&self) -> Option<u16> {
        match self {
            Block::Legacy { id, .. } => Some(*id),
            Block::State(_) => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Block::Legacy { .. } => None,
            Block::State(state) => Some(&state.name),
        }
    }
}

impl fmt::Display for Block<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Block::Legacy { id, data: 0 } => write!(f, "{id}"),
            Block::Legacy { id, data } => write!(f, "{id}:{data}"),
            Block::State(state) => fmt::Display::fmt(state, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_from_compound() {
        let c = Compound::new()
            .with("Name", "minecraft:oak_stairs")
            .with(
                "Properties",
                Compound::new().with("facing", "east").with("half", "bottom"),
            );
        let state = BlockState::from_compound(&c).unwrap();

        assert_eq!(state.property("facing"), Some("east"));
        assert_eq!(state.property("shape"), None);
        assert_eq!(state.to_string(), "minecraft:oak_stairs[facing=east,half=bottom]");
        assert!(!state.is_air());
    }

    #[test]
    fn test_missing_name_is_an_error() {
        let err = BlockState::from_compound(&Compound::new().with("name", "x")).unwrap_err();
        assert_eq!(err.path, "Name");
    }

    #[test]
    fn test_air_variants() {
        assert!(BlockState::new("minecraft:cave_air").is_air());
        assert!(Block::State(&BlockState::air()).is_air());
        assert!(Block::Legacy { id: 0, data: 0 }.is_air());
        assert!(!Block::Legacy { id: 1, data: 0 }.is_air());
        assert_eq!(Block::Legacy { id: 35, data: 14 }.to_string(), "35:14");
    }
}
