// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{decode_node, DevicePathNode, NodeError};
use core::fmt::{self, Display, Formatter};
use log::debug;

/// Errors walking a chain of nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainError {
    /// The buffer ended before an end-entire node was found.
    TruncatedChain {
        /// Bytes consumed before the buffer ran out.
        offset: usize,
    },
    /// A node in the chain is malformed.
    Node(NodeError),
    /// The chain is longer than a 16-bit length can describe.
    ChainTooLong {
        /// Size of the chain in bytes.
        size: usize,
    },
}

impl Display for ChainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::TruncatedChain { offset } => {
                write!(f, "device path ends after {offset} bytes without an end node")
            }
            Self::Node(err) => Display::fmt(err, f),
            Self::ChainTooLong { size } => {
                write!(f, "device path of {size} bytes does not fit a 16-bit length")
            }
        }
    }
}

impl std::error::Error for ChainError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Node(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NodeError> for ChainError {
    fn from(err: NodeError) -> Self {
        Self::Node(err)
    }
}

/// Lazy iterator over the nodes of an encoded chain.
///
/// Yields every node in order, the end-entire node last. A missing end node
/// or a malformed node is yielded as an error, after which iteration stops.
/// The iterator is cheap to clone, so a walk can be restarted from any point.
#[derive(Clone, Debug)]
pub struct Nodes<'a> {
    buffer: &'a [u8],
    offset: usize,
    done: bool,
}

impl Nodes<'_> {
    /// Offset of the next node to be decoded.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }
}

impl Iterator for Nodes<'_> {
    type Item = Result<DevicePathNode, ChainError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.offset >= self.buffer.len() {
            self.done = true;
            return Some(Err(ChainError::TruncatedChain {
                offset: self.offset,
            }));
        }
        match decode_node(self.buffer, self.offset) {
            Ok((node, len)) => {
                self.offset += len;
                self.done = node.is_end_entire();
                Some(Ok(node))
            }
            Err(NodeError::BufferTooSmall { .. }) => {
                self.done = true;
                Some(Err(ChainError::TruncatedChain {
                    offset: self.offset,
                }))
            }
            Err(err) => {
                self.done = true;
                Some(Err(err.into()))
            }
        }
    }
}

impl core::iter::FusedIterator for Nodes<'_> {}

/// Walk the chain at the start of `buffer`.
#[must_use]
pub const fn decode_chain(buffer: &[u8]) -> Nodes<'_> {
    Nodes {
        buffer,
        offset: 0,
        done: false,
    }
}

/// Nodes that make up a chain: everything up to and including the first
/// end-entire node.
fn chain_prefix(nodes: &[DevicePathNode]) -> (&[DevicePathNode], bool) {
    match nodes.iter().position(DevicePathNode::is_end_entire) {
        Some(end) => {
            if end + 1 < nodes.len() {
                debug!(
                    "dropping {} device path nodes after the end node",
                    nodes.len() - end - 1
                );
            }
            (&nodes[..=end], true)
        }
        None => (nodes, false),
    }
}

/// Encode `nodes` as a chain.
///
/// An end-entire node is appended unless the sequence already has one.
/// Nodes after the first end-entire node are not part of the chain and are
/// not written.
pub fn encode_chain(nodes: &[DevicePathNode]) -> Result<Vec<u8>, NodeError> {
    let (nodes, terminated) = chain_prefix(nodes);
    let mut out = Vec::new();
    for node in nodes {
        node.write_to(&mut out)?;
    }
    if !terminated {
        DevicePathNode::EndEntire.write_to(&mut out)?;
    }
    Ok(out)
}

/// Size in bytes that [`encode_chain`] would produce for `nodes`.
pub fn chain_byte_length(nodes: &[DevicePathNode]) -> Result<u16, ChainError> {
    let (nodes, terminated) = chain_prefix(nodes);
    let mut size = 0;
    for node in nodes {
        let len = node.encoded_len();
        if u16::try_from(len).is_err() {
            let (device_type, sub_type) = node.full_type();
            return Err(NodeError::NodeTooBig {
                device_type,
                sub_type,
                size: len,
            }
            .into());
        }
        size += len;
    }
    if !terminated {
        size += DevicePathNode::EndEntire.encoded_len();
    }
    u16::try_from(size).map_err(|_| ChainError::ChainTooLong { size })
}

/// Owned, terminated device path.
///
/// Holds the nodes of the path without its end-entire node, which is implied
/// and added back when encoding. End-instance nodes may appear to separate
/// the instances of a multi-instance path.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DevicePath {
    nodes: Vec<DevicePathNode>,
}

impl DevicePath {
    /// Empty path, consisting of just the end node once encoded.
    #[must_use]
    pub const fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Decode the chain at the start of `bytes`.
    ///
    /// Bytes after the end node are ignored; see [`DevicePath::parse_prefix`]
    /// to find where the chain ends.
    pub fn parse(bytes: &[u8]) -> Result<Self, ChainError> {
        Self::parse_prefix(bytes).map(|(path, _)| path)
    }

    /// Decode the chain at the start of `bytes` and return it together with
    /// its encoded length.
    pub fn parse_prefix(bytes: &[u8]) -> Result<(Self, usize), ChainError> {
        let mut iter = decode_chain(bytes);
        let mut nodes = Vec::new();
        for node in iter.by_ref() {
            let node = node?;
            if !node.is_end_entire() {
                nodes.push(node);
            }
        }
        Ok((Self { nodes }, iter.offset()))
    }

    /// Like [`DevicePath::parse`], but keeps the nodes decoded before a
    /// failure so they can still be shown.
    pub fn parse_partial(bytes: &[u8]) -> Result<Self, TruncatedChain> {
        let mut nodes = Vec::new();
        for node in decode_chain(bytes) {
            match node {
                Ok(node) if node.is_end_entire() => {}
                Ok(node) => nodes.push(node),
                Err(error) => return Err(TruncatedChain { nodes, error }),
            }
        }
        Ok(Self { nodes })
    }

    /// Append a node.
    ///
    /// An end-entire node is implied by the path and is ignored here.
    pub fn push(&mut self, node: DevicePathNode) -> &mut Self {
        if !node.is_end_entire() {
            self.nodes.push(node);
        }
        self
    }

    /// Nodes of the path, without the end node.
    #[must_use]
    pub fn nodes(&self) -> &[DevicePathNode] {
        &self.nodes
    }

    /// Iterate over the nodes of the path, without the end node.
    pub fn iter(&self) -> core::slice::Iter<'_, DevicePathNode> {
        self.nodes.iter()
    }

    /// True if the path has no nodes besides its end node.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over the instances of a multi-instance path.
    ///
    /// A single-instance path yields one instance.
    pub fn instances(&self) -> impl Iterator<Item = &[DevicePathNode]> {
        self.nodes.split(DevicePathNode::is_end_instance)
    }

    /// Encode the path, end node included.
    pub fn encode(&self) -> Result<Vec<u8>, NodeError> {
        encode_chain(&self.nodes)
    }

    /// Encoded size of the path, end node included.
    pub fn byte_len(&self) -> Result<u16, ChainError> {
        chain_byte_length(&self.nodes)
    }
}

impl FromIterator<DevicePathNode> for DevicePath {
    /// Collect nodes up to the first end-entire node.
    fn from_iter<I: IntoIterator<Item = DevicePathNode>>(iter: I) -> Self {
        let nodes = iter
            .into_iter()
            .take_while(|node| !node.is_end_entire())
            .collect();
        Self { nodes }
    }
}

impl<'a> IntoIterator for &'a DevicePath {
    type Item = &'a DevicePathNode;
    type IntoIter = core::slice::Iter<'a, DevicePathNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Chain that could not be decoded completely.
///
/// Holds the nodes read before the failure for display. It cannot be
/// encoded; build a [`DevicePath`] explicitly to write a path back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TruncatedChain {
    nodes: Vec<DevicePathNode>,
    error: ChainError,
}

impl TruncatedChain {
    /// Nodes decoded before the failure.
    #[must_use]
    pub fn nodes(&self) -> &[DevicePathNode] {
        &self.nodes
    }

    /// What stopped the walk.
    #[must_use]
    pub const fn error(&self) -> ChainError {
        self.error
    }
}

impl Display for TruncatedChain {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} after {} nodes", self.error, self.nodes.len())
    }
}

impl std::error::Error for TruncatedChain {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device_path::{acpi, hardware, media};

    fn sample_nodes() -> Vec<DevicePathNode> {
        vec![
            acpi::Acpi::pci_root(0).into(),
            hardware::Pci {
                function: 2,
                device: 0x1f,
            }
            .into(),
            media::FilePath::new(r"\EFI\BOOT\BOOTX64.EFI").unwrap().into(),
        ]
    }

    #[test]
    fn test_chain_termination() {
        let bytes = encode_chain(&sample_nodes()).unwrap();
        let nodes: Vec<_> = decode_chain(&bytes).collect::<Result<_, _>>().unwrap();
        assert_eq!(nodes.len(), 4);
        assert_eq!(
            nodes.iter().filter(|n| n.is_end_entire()).count(),
            1
        );
        assert!(nodes[3].is_end_entire());

        let mut iter = decode_chain(&bytes);
        iter.by_ref().for_each(drop);
        assert_eq!(iter.offset(), bytes.len());
    }

    #[test]
    fn test_encode_appends_single_end() {
        let mut nodes = sample_nodes();
        let implicit = encode_chain(&nodes).unwrap();
        nodes.push(DevicePathNode::EndEntire);
        assert_eq!(encode_chain(&nodes).unwrap(), implicit);

        // Nodes after the end node are not part of the chain.
        nodes.push(hardware::Pci { function: 0, device: 0 }.into());
        assert_eq!(encode_chain(&nodes).unwrap(), implicit);

        assert_eq!(encode_chain(&[]).unwrap(), [0x7f, 0xff, 0x04, 0x00]);
    }

    #[test]
    fn test_chain_byte_length() {
        let nodes = sample_nodes();
        let bytes = encode_chain(&nodes).unwrap();
        assert_eq!(usize::from(chain_byte_length(&nodes).unwrap()), bytes.len());
        // 12 + 6 + 48 + 4
        assert_eq!(bytes.len(), 70);
        assert_eq!(chain_byte_length(&[]).unwrap(), 4);
    }

    #[test]
    fn test_chain_too_long() {
        let big = DevicePathNode::Unknown(crate::device_path::UnknownNode {
            device_type: crate::device_path::DeviceType(0xf0),
            sub_type: crate::device_path::DeviceSubType(1),
            data: vec![0; 40_000],
        });
        let nodes = vec![big.clone(), big];
        assert_eq!(
            chain_byte_length(&nodes),
            Err(ChainError::ChainTooLong { size: 80_012 })
        );
    }

    #[test]
    fn test_truncated_single_node() {
        // Pci node, no end node.
        let bytes = [0x01, 0x01, 0x06, 0x00, 0x02, 0x1f];
        let items: Vec<_> = decode_chain(&bytes).collect();
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert_eq!(items[1], Err(ChainError::TruncatedChain { offset: 6 }));

        assert_eq!(
            DevicePath::parse(&bytes),
            Err(ChainError::TruncatedChain { offset: 6 })
        );
        let partial = DevicePath::parse_partial(&bytes).unwrap_err();
        assert_eq!(partial.nodes().len(), 1);
        assert_eq!(partial.error(), ChainError::TruncatedChain { offset: 6 });
    }

    #[test]
    fn test_truncated_header() {
        // Pci node followed by two stray bytes.
        let bytes = [0x01, 0x01, 0x06, 0x00, 0x02, 0x1f, 0x7f, 0xff];
        assert_eq!(
            DevicePath::parse(&bytes),
            Err(ChainError::TruncatedChain { offset: 6 })
        );
        assert_eq!(
            DevicePath::parse(&[]),
            Err(ChainError::TruncatedChain { offset: 0 })
        );
    }

    #[test]
    fn test_malformed_node_stops_walk() {
        // Pci node claiming 3 bytes.
        let bytes = [0x01, 0x01, 0x03, 0x00, 0x7f, 0xff, 0x04, 0x00];
        let items: Vec<_> = decode_chain(&bytes).collect();
        assert_eq!(items.len(), 1);
        assert!(matches!(
            items[0],
            Err(ChainError::Node(NodeError::InvalidNodeLength { offset: 0, .. }))
        ));
    }

    #[test]
    fn test_restartable() {
        let bytes = encode_chain(&sample_nodes()).unwrap();
        let mut iter = decode_chain(&bytes);
        iter.next();
        let saved = iter.clone();
        let rest: Vec<_> = iter.collect();
        let again: Vec<_> = saved.collect();
        assert_eq!(rest, again);
        assert_eq!(rest.len(), 3);
    }

    #[test]
    fn test_device_path_parse() {
        let bytes = encode_chain(&sample_nodes()).unwrap();
        let path = DevicePath::parse(&bytes).unwrap();
        assert_eq!(path.nodes(), sample_nodes().as_slice());
        assert_eq!(path.encode().unwrap(), bytes);
        assert_eq!(usize::from(path.byte_len().unwrap()), bytes.len());

        // Trailing bytes after the end node are not consumed.
        let mut padded = bytes.clone();
        padded.extend_from_slice(&[0xaa; 3]);
        assert_eq!(
            DevicePath::parse_prefix(&padded).unwrap(),
            (path, bytes.len())
        );
    }

    #[test]
    fn test_instances() {
        let pci = |device| DevicePathNode::from(hardware::Pci { function: 0, device });
        let path: DevicePath = [pci(1), DevicePathNode::EndInstance, pci(2), pci(3)]
            .into_iter()
            .collect();
        let instances: Vec<_> = path.instances().collect();
        assert_eq!(instances, [&[pci(1)][..], &[pci(2), pci(3)][..]]);

        let single: DevicePath = [pci(4)].into_iter().collect();
        assert_eq!(single.instances().count(), 1);

        let bytes = path.encode().unwrap();
        assert_eq!(DevicePath::parse(&bytes).unwrap(), path);
    }

    #[test]
    fn test_push_ignores_end() {
        let mut path = DevicePath::new();
        path.push(DevicePathNode::EndEntire)
            .push(hardware::Controller { controller_number: 1 }.into());
        assert_eq!(path.nodes().len(), 1);
        assert!(!path.is_empty());
    }
}
