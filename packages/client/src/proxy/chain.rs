//! Ordered SOCKS hop chains

use std::sync::Arc;

use serde::Deserialize;

use super::descriptor::ProxyDescriptor;
use crate::config::ConfigurationError;
use crate::connect::TargetAddr;
use crate::error::{self, Result};

/// Ordered list of hops to traverse before reaching the target.
///
/// An empty chain means "connect directly". Hop *i* is asked to reach
/// hop *i + 1*; the last hop is asked to reach the target.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "ChainRepr")]
pub struct ProxyChain {
    hops: Arc<[ProxyDescriptor]>,
}

/// A configuration file may name a single proxy or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum ChainRepr {
    One(ProxyDescriptor),
    Many(Vec<ProxyDescriptor>),
}

impl From<ChainRepr> for ProxyChain {
    fn from(repr: ChainRepr) -> Self {
        match repr {
            ChainRepr::One(hop) => ProxyChain::from(hop),
            ChainRepr::Many(hops) => ProxyChain::new(hops),
        }
    }
}

impl ProxyChain {
    #[must_use]
    pub fn new(hops: Vec<ProxyDescriptor>) -> Self {
        Self { hops: hops.into() }
    }

    /// The empty chain.
    #[must_use]
    pub fn direct() -> Self {
        Self::default()
    }

    /// Parse a chain from JSON: either one descriptor object or an array.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the document is malformed, names
    /// an unknown field, or describes an invalid hop.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| error::configuration(ConfigurationError::MalformedEntry(e.to_string())))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hops.len()
    }

    #[must_use]
    pub fn hops(&self) -> &[ProxyDescriptor] {
        &self.hops
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProxyDescriptor> {
        self.hops.iter()
    }

    /// Destination hop `index` must be asked to reach: the next hop's
    /// address, or `target` for the last hop.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the next hop has no address or
    /// `index` is outside the chain.
    pub fn destination(&self, index: usize, target: &TargetAddr) -> Result<TargetAddr> {
        match self.hops.get(index + 1) {
            Some(next) => next.address().map_err(error::configuration),
            None if index < self.hops.len() => Ok(target.clone()),
            None => Err(error::configuration(ConfigurationError::InvalidParameter(
                format!("hop index {index} is outside a chain of {}", self.hops.len()),
            ))),
        }
    }
}

impl From<ProxyDescriptor> for ProxyChain {
    fn from(hop: ProxyDescriptor) -> Self {
        Self::new(vec![hop])
    }
}

impl From<Vec<ProxyDescriptor>> for ProxyChain {
    fn from(hops: Vec<ProxyDescriptor>) -> Self {
        Self::new(hops)
    }
}

impl FromIterator<ProxyDescriptor> for ProxyChain {
    fn from_iter<T: IntoIterator<Item = ProxyDescriptor>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ProxyChain {
    type Item = &'a ProxyDescriptor;
    type IntoIter = std::slice::Iter<'a, ProxyDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.hops.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::SocksVersion;

    fn hop(port: u16) -> ProxyDescriptor {
        ProxyDescriptor::socks5("127.0.0.1", port).expect("valid descriptor")
    }

    #[test]
    fn destinations_follow_the_chain() {
        let chain = ProxyChain::new(vec![hop(1001), hop(1002), hop(1003)]);
        let target = TargetAddr::new("example.com", 443);

        assert_eq!(
            chain.destination(0, &target).expect("hop 0"),
            TargetAddr::new("127.0.0.1", 1002)
        );
        assert_eq!(
            chain.destination(1, &target).expect("hop 1"),
            TargetAddr::new("127.0.0.1", 1003)
        );
        assert_eq!(chain.destination(2, &target).expect("hop 2"), target);
        assert!(chain.destination(3, &target).is_err());
    }

    #[test]
    fn json_single_object_or_array() {
        let one = ProxyChain::from_json(r#"{"type": 5, "host": "127.0.0.1", "port": 1080}"#)
            .expect("single descriptor");
        assert_eq!(one.len(), 1);

        let many = ProxyChain::from_json(
            r#"[{"type": 5, "host": "127.0.0.1", "port": 1080},
                {"type": 4, "ipaddress": "10.1.2.3", "port": 1081}]"#,
        )
        .expect("descriptor list");
        assert_eq!(many.len(), 2);
        assert_eq!(many.hops()[1].version(), SocksVersion::V4);

        let empty = ProxyChain::from_json("[]").expect("empty list");
        assert!(empty.is_empty());
    }

    #[test]
    fn json_with_invalid_hop_is_a_configuration_error() {
        let err = ProxyChain::from_json(r#"[{"type": 5, "port": 1080}]"#)
            .expect_err("hop without address");
        assert!(err.is_configuration());
    }
}
