use std::collections::BTreeMap;

use derive_getters::Getters;
use eyre::{eyre, Result};

/// Destination for saved results: a tree of named groups holding scalar attributes, numeric
/// datasets and string-list datasets. Concrete storage formats implement this trait.
pub trait GroupWriter {
    fn create_group(&mut self, name: &str) -> Result<Box<dyn GroupWriter + '_>>;

    fn write_attr(&mut self, name: &str, value: f64) -> Result<()>;

    fn write_numeric(&mut self, name: &str, data: &[f64]) -> Result<()>;

    fn write_strings(&mut self, name: &str, data: &[String]) -> Result<()>;
}

impl<T: GroupWriter + ?Sized> GroupWriter for &mut T {
    fn create_group(&mut self, name: &str) -> Result<Box<dyn GroupWriter + '_>> {
        (**self).create_group(name)
    }

    fn write_attr(&mut self, name: &str, value: f64) -> Result<()> {
        (**self).write_attr(name, value)
    }

    fn write_numeric(&mut self, name: &str, data: &[f64]) -> Result<()> {
        (**self).write_numeric(name, data)
    }

    fn write_strings(&mut self, name: &str, data: &[String]) -> Result<()> {
        (**self).write_strings(name, data)
    }
}

/// In-memory group tree. Names are unique per group, writing the same name twice is an error.
#[derive(Clone, PartialEq, Debug, Default, Getters)]
pub struct MemoryGroup {
    attrs: BTreeMap<String, f64>,
    numeric: BTreeMap<String, Vec<f64>>,
    strings: BTreeMap<String, Vec<String>>,
    groups: BTreeMap<String, MemoryGroup>,
}

impl MemoryGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group(&self, name: &str) -> Option<&MemoryGroup> {
        self.groups.get(name)
    }

    fn ensure_unique(&self, name: &str) -> Result<()> {
        if self.attrs.contains_key(name)
            || self.numeric.contains_key(name)
            || self.strings.contains_key(name)
            || self.groups.contains_key(name)
        {
            return Err(eyre!("Name {name} is already taken in the group"));
        }
        Ok(())
    }
}

impl GroupWriter for MemoryGroup {
    fn create_group(&mut self, name: &str) -> Result<Box<dyn GroupWriter + '_>> {
        self.ensure_unique(name)?;
        let group = self.groups.entry(name.to_string()).or_default();
        Ok(Box::new(group))
    }

    fn write_attr(&mut self, name: &str, value: f64) -> Result<()> {
        self.ensure_unique(name)?;
        self.attrs.insert(name.to_string(), value);
        Ok(())
    }

    fn write_numeric(&mut self, name: &str, data: &[f64]) -> Result<()> {
        self.ensure_unique(name)?;
        self.numeric.insert(name.to_string(), data.to_vec());
        Ok(())
    }

    fn write_strings(&mut self, name: &str, data: &[String]) -> Result<()> {
        self.ensure_unique(name)?;
        self.strings.insert(name.to_string(), data.to_vec());
        Ok(())
    }
}
