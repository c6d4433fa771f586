use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;

/// Typed identifier wrapping a raw numeric value.
///
/// The tag parameter keeps switch ids and tunnel ids from being mixed up even though
/// both are plain integers on the wire.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Serialize)]
#[serde(transparent, bound(serialize = "R: Serialize"))]
pub struct Id<T, R = u64> {
    pub raw: R,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T, R> Id<T, R> {
    pub const fn new(raw: R) -> Self {
        Id { raw, _marker: PhantomData }
    }
}

impl<T, R: fmt::LowerHex> fmt::Display for Id<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.raw)
    }
}

impl<T, R: fmt::LowerHex> fmt::Debug for Id<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full_name = std::any::type_name::<T>();
        let clean_name = full_name.split("::").last().unwrap_or(full_name);
        let display_name = clean_name.replace("Tag", "Id");

        write!(f, "{}({:#x})", display_name, self.raw)
    }
}

impl<T> From<u64> for Id<T, u64> {
    fn from(raw: u64) -> Self {
        Id::new(raw)
    }
}

impl<T> From<u16> for Id<T, u16> {
    fn from(raw: u16) -> Self {
        Id::new(raw)
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct SwitchTag;
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct TunnelTag;

/// Datapath id of an OpenFlow switch.
pub type SwitchId = Id<SwitchTag>;

/// Identifier of a label-switched tunnel. Tunnel ids are 16 bits wide.
pub type TunnelId = Id<TunnelTag, u16>;
