//! Register hierarchies.
//!
//! Physical registers overlap: on x86-64 `al` is the low byte of `ax`,
//! which is the low half of `eax`, which is the low half of `rax`. The host
//! only hands out a register index and a dtype, and the same index is
//! shared by every view of a register family. An [`Architecture`] records
//! each family as a tree so that containment questions ("does writing
//! `eax` clobber `al`?") can be answered, and caches the `(host name,
//! dtype)` pairs the host uses to identify each view.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use crate::{Dtype, Error, Processor, Result};

/// Identifies a register within the architecture that defined it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegisterId(u32);

impl RegisterId {
    /// Creates an id from its index into the architecture's register list.
    pub fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Returns the index into the architecture's register list.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Description of a register to add to an architecture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterDef {
    name: String,
    bits: u32,
    host_name: Option<String>,
    dtype: Option<Dtype>,
    aliases: HashSet<String>,
}

impl RegisterDef {
    /// Creates a definition for a register of `bits` bits.
    pub fn new(name: impl Into<String>, bits: u32) -> Self {
        Self {
            name: name.into(),
            bits,
            host_name: None,
            dtype: None,
            aliases: HashSet::new(),
        }
    }

    /// Sets the name the host's register table uses for this register.
    pub fn host_name(mut self, name: impl Into<String>) -> Self {
        self.host_name = Some(name.into());
        self
    }

    /// Overrides the dtype derived from the register's size.
    pub fn dtype(mut self, dtype: Dtype) -> Self {
        self.dtype = Some(dtype);
        self
    }

    /// Adds a name that is treated as the same register when matching.
    pub fn alias(mut self, name: impl AsRef<str>) -> Self {
        self.aliases.insert(name.as_ref().to_lowercase());
        self
    }

    /// Adds several aliases.
    pub fn aliases<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.aliases
            .extend(names.into_iter().map(|n| n.as_ref().to_lowercase()));
        self
    }
}

#[derive(Debug, Clone)]
struct RegisterNode {
    name: String,
    bits: u32,
    position: u32,
    dtype: Dtype,
    host_name: Option<String>,
    aliases: HashSet<String>,
    parent: Option<RegisterId>,
    children: BTreeMap<u32, RegisterId>,
}

/// The registers of one processor.
#[derive(Debug, Clone, Default)]
pub struct Architecture {
    name: String,
    prefix: String,
    nodes: Vec<RegisterNode>,
    by_name: HashMap<String, RegisterId>,
    cache: HashMap<(String, Dtype), RegisterId>,
}

impl Architecture {
    /// Creates an empty architecture.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the prefix used when displaying register names (`%` for AT&T syntax).
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Returns the architecture's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the display prefix for register names.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the number of registers defined.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if no registers have been defined.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Defines the root of a register family.
    pub fn define_root(&mut self, def: RegisterDef) -> Result<RegisterId> {
        self.insert(def, None, 0)
    }

    /// Defines a sub-register occupying `bits` bits of `parent` starting at bit `position`.
    pub fn define_child(
        &mut self,
        parent: RegisterId,
        position: u32,
        def: RegisterDef,
    ) -> Result<RegisterId> {
        let owner = self
            .nodes
            .get(parent.index())
            .ok_or_else(|| Error::UnknownRegister(format!("#{}", parent.index())))?;

        let end = position.checked_add(def.bits);
        if end.map_or(true, |end| end > owner.bits) {
            return Err(Error::out_of_bounds(def.name, position, def.bits, owner.bits));
        }

        for sibling in owner.children.values() {
            let other = &self.nodes[sibling.index()];
            if position < other.position + other.bits && other.position < position + def.bits {
                return Err(Error::RegisterOverlap {
                    name: def.name,
                    sibling: other.name.clone(),
                });
            }
        }

        let id = self.insert(def, Some(parent), position)?;
        self.nodes[parent.index()].children.insert(position, id);
        Ok(id)
    }

    fn insert(
        &mut self,
        def: RegisterDef,
        parent: Option<RegisterId>,
        position: u32,
    ) -> Result<RegisterId> {
        let key = def.name.to_lowercase();
        if self.by_name.contains_key(&key) {
            return Err(Error::RegisterExists(def.name));
        }

        let dtype = match def.dtype {
            Some(dtype) => dtype,
            None if def.bits == 1 => Dtype::Bitfield,
            None => Dtype::from_size(def.bits / 8)
                .filter(|_| def.bits % 8 == 0)
                .ok_or(Error::UnsupportedRegisterSize(def.bits / 8))?,
        };

        let id = RegisterId::from_index(self.nodes.len());
        let host_key = def
            .host_name
            .as_deref()
            .unwrap_or(def.name.as_str())
            .to_lowercase();
        self.cache.insert((host_key, dtype), id);
        self.by_name.insert(key, id);
        self.nodes.push(RegisterNode {
            name: def.name,
            bits: def.bits,
            position,
            dtype,
            host_name: def.host_name,
            aliases: def.aliases,
            parent,
            children: BTreeMap::new(),
        });
        Ok(id)
    }

    /// Returns the register with the given id.
    pub fn get(&self, id: RegisterId) -> Option<Register<'_>> {
        self.nodes.get(id.index()).map(|_| Register { arch: self, id })
    }

    /// Iterates over every register in definition order.
    pub fn registers(&self) -> impl Iterator<Item = Register<'_>> {
        (0..self.nodes.len()).map(move |i| Register {
            arch: self,
            id: RegisterId::from_index(i),
        })
    }

    /// Looks up a register by name.
    ///
    /// The lookup is case-insensitive and ignores the `%` (AT&T) and `$`
    /// (MIPS) register prefixes.
    pub fn by_name(&self, name: &str) -> Result<Register<'_>> {
        let bare = name
            .strip_prefix('%')
            .or_else(|| name.strip_prefix('$'))
            .unwrap_or(name);
        self.by_name
            .get(&bare.to_lowercase())
            .map(|id| Register { arch: self, id: *id })
            .ok_or_else(|| Error::UnknownRegister(name.to_string()))
    }

    /// Looks up a register by the host's register index.
    pub fn by_index(&self, processor: &dyn Processor, index: u16) -> Result<Register<'_>> {
        let name = processor
            .register_name(index)
            .ok_or(Error::UnknownRegisterIndex(index))?;
        self.by_name(name)
    }

    /// Looks up the view of a register family selected by the host's
    /// register index and dtype.
    pub fn by_index_and_dtype(
        &self,
        processor: &dyn Processor,
        index: u16,
        dtype: Dtype,
    ) -> Result<Register<'_>> {
        let name = processor
            .register_name(index)
            .ok_or(Error::UnknownRegisterIndex(index))?
            .to_lowercase();
        match self.cache.get(&(name, dtype)) {
            Some(id) => Ok(Register { arch: self, id: *id }),
            None => Err(Error::UnknownRegisterView {
                name: processor.register_name(index).unwrap_or_default().to_string(),
                dtype,
            }),
        }
    }

    /// Looks up the view of a register family selected by the host's
    /// register index and an access size in bytes.
    pub fn by_index_and_size(
        &self,
        processor: &dyn Processor,
        index: u16,
        size: u32,
    ) -> Result<Register<'_>> {
        let dtype = Dtype::from_size(size).ok_or(Error::UnsupportedRegisterSize(size))?;
        self.by_index_and_dtype(processor, index, dtype)
    }

    /// Walks up the family from `register`.
    ///
    /// Without a size this returns the immediate parent; with one it returns
    /// the nearest ancestor that has `bits` bits.
    pub fn promote(&self, register: RegisterId, bits: Option<u32>) -> Result<Register<'_>> {
        let start = self.node(register)?;
        let mut current = start.parent;
        while let Some(id) = current {
            let node = &self.nodes[id.index()];
            if bits.map_or(true, |b| b == node.bits) {
                return Ok(Register { arch: self, id });
            }
            current = node.parent;
        }
        Err(Error::not_found("promote", start.name.clone(), bits))
    }

    /// Walks down the family from `register` through the lowest-positioned child.
    ///
    /// Without a size this returns that first child; with one it returns the
    /// nearest descendant on that path that has `bits` bits.
    pub fn demote(&self, register: RegisterId, bits: Option<u32>) -> Result<Register<'_>> {
        let start = self.node(register)?;
        let mut current = start.children.values().next().copied();
        while let Some(id) = current {
            let node = &self.nodes[id.index()];
            if bits.map_or(true, |b| b == node.bits) {
                return Ok(Register { arch: self, id });
            }
            current = node.children.values().next().copied();
        }
        Err(Error::not_found("demote", start.name.clone(), bits))
    }

    fn node(&self, id: RegisterId) -> Result<&RegisterNode> {
        self.nodes
            .get(id.index())
            .ok_or_else(|| Error::UnknownRegister(format!("#{}", id.index())))
    }

    fn descendants(&self, id: RegisterId) -> Vec<RegisterId> {
        let mut found = vec![id];
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            for child in self.nodes[next.index()].children.values() {
                found.push(*child);
                pending.push(*child);
            }
        }
        found
    }

    fn ancestors(&self, id: RegisterId) -> Vec<RegisterId> {
        let mut found = vec![id];
        let mut current = self.nodes[id.index()].parent;
        while let Some(parent) = current {
            found.push(parent);
            current = self.nodes[parent.index()].parent;
        }
        found
    }
}

/// A register of an [`Architecture`].
#[derive(Clone, Copy)]
pub struct Register<'a> {
    arch: &'a Architecture,
    id: RegisterId,
}

impl<'a> Register<'a> {
    fn node(&self) -> &'a RegisterNode {
        &self.arch.nodes[self.id.index()]
    }

    /// Returns the register's id.
    pub fn id(&self) -> RegisterId {
        self.id
    }

    /// Returns the architecture owning the register.
    pub fn architecture(&self) -> &'a Architecture {
        self.arch
    }

    /// Returns the register's name.
    pub fn name(&self) -> &'a str {
        &self.node().name
    }

    /// Returns the name the host uses, if it differs from [`Register::name`].
    pub fn host_name(&self) -> Option<&'a str> {
        self.node().host_name.as_deref()
    }

    /// Returns the size of the register in bits.
    pub fn size(&self) -> u32 {
        self.node().bits
    }

    /// Returns the bit offset of the register within its parent.
    pub fn position(&self) -> u32 {
        self.node().position
    }

    /// Returns the host dtype of this view.
    pub fn dtype(&self) -> Dtype {
        self.node().dtype
    }

    /// Returns the names treated as equal to this register.
    pub fn aliases(&self) -> impl Iterator<Item = &'a str> {
        self.node().aliases.iter().map(String::as_str)
    }

    /// Returns the register this one is a part of.
    pub fn parent(&self) -> Option<Register<'a>> {
        self.node().parent.map(|id| Register { arch: self.arch, id })
    }

    /// Returns the direct sub-registers ordered by position.
    pub fn children(&self) -> impl Iterator<Item = Register<'a>> + 'a {
        let arch = self.arch;
        self.node()
            .children
            .values()
            .map(move |id| Register { arch, id: *id })
    }

    /// Returns the host's index for the register, or `None` if the
    /// processor's register table does not list it.
    pub fn host_index(&self, processor: &dyn Processor) -> Option<u16> {
        let name = self.host_name().unwrap_or(self.name());
        processor.register_index(name).or_else(|| {
            processor
                .register_names()
                .iter()
                .position(|n| n.eq_ignore_ascii_case(name))
                .and_then(|i| u16::try_from(i).ok())
        })
    }

    /// Returns true if `other` is a direct sub-register.
    pub fn contains(&self, other: &Register<'_>) -> bool {
        self.same_arch(other) && self.node().children.values().any(|id| *id == other.id)
    }

    fn same_arch(&self, other: &Register<'_>) -> bool {
        std::ptr::eq(self.arch, other.arch)
    }

    fn is_alias(&self, other: &Register<'_>) -> bool {
        self.node().aliases.contains(&other.name().to_lowercase())
    }

    /// Returns true if `other` is part of this register: either this
    /// register itself, one of its descendants, or an alias.
    pub fn is_subset_of(&self, other: &Register<'_>) -> bool {
        self.is_alias(other)
            || (self.same_arch(other) && self.arch.descendants(self.id).contains(&other.id))
    }

    /// Returns true if `other` contains this register: either this register
    /// itself, one of its ancestors, or an alias.
    pub fn is_superset_of(&self, other: &Register<'_>) -> bool {
        self.is_alias(other)
            || (self.same_arch(other) && self.arch.ancestors(self.id).contains(&other.id))
    }

    /// Returns true if modifying either register affects the other.
    pub fn is_related_to(&self, other: &Register<'_>) -> bool {
        self.is_superset_of(other) || self.is_subset_of(other)
    }
}

impl PartialEq for Register<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.same_arch(other) && self.id == other.id
    }
}

impl Eq for Register<'_> {}

impl PartialEq<str> for Register<'_> {
    fn eq(&self, other: &str) -> bool {
        self.name().eq_ignore_ascii_case(other)
    }
}

impl fmt::Display for Register<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.arch.prefix, self.name())
    }
}

impl fmt::Debug for Register<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<register({},{}) {:?} {}:{:+}>",
            self.id.index(),
            self.dtype().name(),
            self.name(),
            self.position(),
            self.size()
        )
    }
}
