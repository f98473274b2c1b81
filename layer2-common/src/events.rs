use layer2_core::LinkType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
	Opened { link_type: LinkType },
	Dispatched { frames: usize, backlog: bool },
	BufferTooSmall { capacity: usize },
	SourceError(String),
	Closed,
}
