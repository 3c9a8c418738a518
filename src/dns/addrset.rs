use std::net::IpAddr;

/// Ordered, non-empty result of one resolution.
///
/// The only constructors refuse an empty list, so a held `AddressSet` always
/// has at least one address to select from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressSet {
    addrs: Vec<IpAddr>,
}

impl AddressSet {
    /// `None` if `addrs` is empty. Order and duplicates are kept.
    pub fn new(addrs: Vec<IpAddr>) -> Option<Self> {
        if addrs.is_empty() {
            None
        } else {
            Some(Self { addrs })
        }
    }

    /// A set holding exactly one address (literal-IP hosts).
    pub fn single(addr: IpAddr) -> Self {
        Self { addrs: vec![addr] }
    }

    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    /// Never true: a set holds at least one address.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn first(&self) -> IpAddr {
        self.addrs[0]
    }

    pub fn get(&self, index: usize) -> Option<IpAddr> {
        self.addrs.get(index).copied()
    }

    pub fn contains(&self, addr: &IpAddr) -> bool {
        self.addrs.contains(addr)
    }

    pub fn iter(&self) -> impl Iterator<Item = &IpAddr> {
        self.addrs.iter()
    }

    pub fn as_slice(&self) -> &[IpAddr] {
        &self.addrs
    }

    /// Keeps only addresses matching `keep`; `None` if nothing is left.
    pub fn filter(self, keep: impl Fn(&IpAddr) -> bool) -> Option<Self> {
        Self::new(self.addrs.into_iter().filter(|a| keep(a)).collect())
    }
}

impl IntoIterator for AddressSet {
    type Item = IpAddr;
    type IntoIter = std::vec::IntoIter<IpAddr>;

    fn into_iter(self) -> Self::IntoIter {
        self.addrs.into_iter()
    }
}
