//! IEEE 802.11 frame records.

use serde::{Deserialize, Serialize};

use super::MacAddr;

/// Fields shared by every 802.11 frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Dot11Header {
	pub to_ds: bool,
	pub from_ds: bool,
	pub more_frag: bool,
	pub retry: bool,
	pub power_mgmt: bool,
	pub wep: bool,
	pub order: bool,
	pub duration_id: i32,
	pub addr1: MacAddr,
}

/// Sequence control and the remaining address slots of a management frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MgmtHeader {
	pub frag_num: i32,
	pub seq_num: i32,
	pub addr2: MacAddr,
	pub addr3: MacAddr,
	pub addr4: MacAddr,
}

/// Sequence control and the remaining address slots of a data frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DataHeader {
	pub frag_num: i32,
	pub seq_num: i32,
	pub addr2: MacAddr,
	pub addr3: MacAddr,
	pub addr4: MacAddr,
}

/// Capability information bits, in bit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
	Ess,
	Ibss,
	CfPoll,
	CfPollReq,
	Privacy,
	ShortPreamble,
	Pbcc,
	ChannelAgility,
	SpectrumMgmt,
	Qos,
	Sst,
	Apsd,
	RadioMeasurement,
	DsssOfdm,
	DelayedBlockAck,
	ImmediateBlockAck,
}

impl Capability {
	const ORDERED: [Self; 16] = [
		Self::Ess,
		Self::Ibss,
		Self::CfPoll,
		Self::CfPollReq,
		Self::Privacy,
		Self::ShortPreamble,
		Self::Pbcc,
		Self::ChannelAgility,
		Self::SpectrumMgmt,
		Self::Qos,
		Self::Sst,
		Self::Apsd,
		Self::RadioMeasurement,
		Self::DsssOfdm,
		Self::DelayedBlockAck,
		Self::ImmediateBlockAck,
	];

	/// Expands a capability field, bit 0 first.
	pub fn from_bits(bits: u16) -> Vec<Self> {
		Self::ORDERED
			.iter()
			.enumerate()
			.filter(|(bit, _)| bits & (1 << bit) != 0)
			.map(|(_, cap)| *cap)
			.collect()
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManagementBody {
	AssocRequest {
		capabilities: Vec<Capability>,
		listen_interval: u16,
	},
	AssocResponse {
		capabilities: Vec<Capability>,
		status_code: u16,
		aid: u16,
	},
	Authentication {
		auth_algorithm: u16,
		auth_seq_number: u16,
		status_code: u16,
	},
	Beacon {
		timestamp: u64,
		interval: u16,
		capabilities: Vec<Capability>,
	},
	Deauthentication {
		reason_code: u16,
	},
	Disassoc {
		reason_code: u16,
	},
	ProbeRequest,
	ProbeResponse {
		timestamp: u64,
		interval: u16,
		capabilities: Vec<Capability>,
	},
	ReassocRequest {
		capabilities: Vec<Capability>,
		listen_interval: u16,
		current_ap: MacAddr,
	},
	ReassocResponse {
		capabilities: Vec<Capability>,
		status_code: u16,
		aid: u16,
	},
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagementFrame {
	pub header: Dot11Header,
	pub mgmt_header: MgmtHeader,
	pub body: ManagementBody,
}

/// Block ack control and starting sequence of BlockAck/BlockAckRequest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockAckInfo {
	pub bar_control: u16,
	pub start_seq: u16,
	pub frag_num: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlBody {
	Ack,
	BlockAck(BlockAckInfo),
	BlockAckRequest(BlockAckInfo),
	CfEnd,
	EndCfAck,
	PsPoll,
	Rts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlFrame {
	pub header: Dot11Header,
	pub body: ControlBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataBody {
	Data,
	QosData { qos_control: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataFrame {
	pub header: Dot11Header,
	pub data_header: DataHeader,
	pub body: DataBody,
}

/// A decoded 802.11 frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dot11 {
	Management(ManagementFrame),
	Control(ControlFrame),
	Data(DataFrame),
}

impl Dot11 {
	pub fn type_name(&self) -> &'static str {
		match self {
			Dot11::Management(frame) => match frame.body {
				ManagementBody::AssocRequest { .. } => "DOT11_ASSOC_REQ",
				ManagementBody::AssocResponse { .. } => "DOT11_ASSOC_RESP",
				ManagementBody::Authentication { .. } => "DOT11_AUTH",
				ManagementBody::Beacon { .. } => "DOT11_BEACON",
				ManagementBody::Deauthentication { .. } => "DOT11_DEAUTH",
				ManagementBody::Disassoc { .. } => "DOT11_DISASSOC",
				ManagementBody::ProbeRequest => "DOT11_PROBE_REQ",
				ManagementBody::ProbeResponse { .. } => "DOT11_PROBE_RESP",
				ManagementBody::ReassocRequest { .. } => "DOT11_REASSOC_REQ",
				ManagementBody::ReassocResponse { .. } => "DOT11_REASSOC_RESP",
			},
			Dot11::Control(frame) => match frame.body {
				ControlBody::Ack => "DOT11_ACK",
				ControlBody::BlockAck(_) => "DOT11_BLOCK_ACK",
				ControlBody::BlockAckRequest(_) => "DOT11_BLOCK_ACK_REQ",
				ControlBody::CfEnd => "DOT11_CF_END",
				ControlBody::EndCfAck => "DOT11_END_CF_ACK",
				ControlBody::PsPoll => "DOT11_PS_POLL",
				ControlBody::Rts => "DOT11_RTS",
			},
			Dot11::Data(frame) => match frame.body {
				DataBody::Data => "DOT11_DATA",
				DataBody::QosData { .. } => "DOT11_QOS_DATA",
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_capabilities_keep_bit_order() {
		// bit 10 is SST here, not short slot time
		let caps = Capability::from_bits(0x0001 | 0x0010 | 0x0400);
		assert_eq!(caps, vec![Capability::Ess, Capability::Privacy, Capability::Sst]);
		assert_eq!(Capability::from_bits(0xffff).len(), 16);
		assert_eq!(Capability::from_bits(0x8000), vec![Capability::ImmediateBlockAck]);
	}
}
