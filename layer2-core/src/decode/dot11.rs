use super::{MALFORMED, read_mac, read_u16, read_u64};
use crate::pdu::{
	BlockAckInfo, Capability, ControlBody, ControlFrame, DataBody, DataFrame, DataHeader, Dot11,
	Dot11Header, MacAddr, ManagementBody, ManagementFrame, MgmtHeader, Unsupported,
};

const TYPE_MANAGEMENT: u8 = 0;
const TYPE_CONTROL: u8 = 1;
const TYPE_DATA: u8 = 2;

const FLAG_TO_DS: u8 = 0x01;
const FLAG_FROM_DS: u8 = 0x02;
const FLAG_MORE_FRAG: u8 = 0x04;
const FLAG_RETRY: u8 = 0x08;
const FLAG_POWER_MGMT: u8 = 0x10;
const FLAG_WEP: u8 = 0x40;
const FLAG_ORDER: u8 = 0x80;

/// Either a decoded frame, or the type name it is kept under.
type Parsed = Result<Dot11, &'static str>;

pub(super) fn decode(bytes: &[u8]) -> Result<Dot11, Unsupported> {
	match parse(bytes) {
		Some(Ok(frame)) => Ok(frame),
		Some(Err(type_name)) => Err(Unsupported::new(type_name, bytes)),
		None => Err(Unsupported::new(MALFORMED, bytes)),
	}
}

fn parse(bytes: &[u8]) -> Option<Parsed> {
	let [fc0, _, ..] = *bytes else {
		return None;
	};
	let frame_type = (fc0 >> 2) & 0x03;
	let subtype = fc0 >> 4;
	match frame_type {
		TYPE_MANAGEMENT => management(bytes, subtype),
		TYPE_CONTROL => control(bytes, subtype),
		TYPE_DATA => data(bytes, subtype),
		_ => Some(Err("DOT11_EXTENSION")),
	}
}

/// Reads frame control, duration and addr1.
fn header(buf: &mut &[u8]) -> Option<Dot11Header> {
	let fc = read_u16(buf)?;
	let flags = (fc >> 8) as u8;
	let duration = read_u16(buf)?;
	let addr1 = read_mac(buf)?;
	Some(Dot11Header {
		to_ds: flags & FLAG_TO_DS != 0,
		from_ds: flags & FLAG_FROM_DS != 0,
		more_frag: flags & FLAG_MORE_FRAG != 0,
		retry: flags & FLAG_RETRY != 0,
		power_mgmt: flags & FLAG_POWER_MGMT != 0,
		wep: flags & FLAG_WEP != 0,
		order: flags & FLAG_ORDER != 0,
		duration_id: i32::from(duration),
		addr1,
	})
}

/// Reads addr2, addr3, sequence control and, between two DS, addr4.
fn addresses(buf: &mut &[u8], header: &Dot11Header) -> Option<(i32, i32, [MacAddr; 3])> {
	let addr2 = read_mac(buf)?;
	let addr3 = read_mac(buf)?;
	let seq_control = read_u16(buf)?;
	let addr4 = if header.to_ds && header.from_ds {
		read_mac(buf)?
	} else {
		MacAddr::ZERO
	};
	Some((
		i32::from(seq_control & 0x0f),
		i32::from(seq_control >> 4),
		[addr2, addr3, addr4],
	))
}

fn management(bytes: &[u8], subtype: u8) -> Option<Parsed> {
	let name = match subtype {
		6 => Some("DOT11_TIMING_ADV"),
		9 => Some("DOT11_ATIM"),
		13 => Some("DOT11_ACTION"),
		14 => Some("DOT11_ACTION_NO_ACK"),
		7 | 15 => Some("DOT11_RESERVED"),
		_ => None,
	};
	if let Some(name) = name {
		return Some(Err(name));
	}

	let mut buf = bytes;
	let header = header(&mut buf)?;
	let (frag_num, seq_num, [addr2, addr3, addr4]) = addresses(&mut buf, &header)?;
	let buf = &mut buf;
	let body = match subtype {
		0 => ManagementBody::AssocRequest {
			capabilities: Capability::from_bits(read_u16(buf)?),
			listen_interval: read_u16(buf)?,
		},
		1 => ManagementBody::AssocResponse {
			capabilities: Capability::from_bits(read_u16(buf)?),
			status_code: read_u16(buf)?,
			aid: read_u16(buf)?,
		},
		2 => ManagementBody::ReassocRequest {
			capabilities: Capability::from_bits(read_u16(buf)?),
			listen_interval: read_u16(buf)?,
			current_ap: read_mac(buf)?,
		},
		3 => ManagementBody::ReassocResponse {
			capabilities: Capability::from_bits(read_u16(buf)?),
			status_code: read_u16(buf)?,
			aid: read_u16(buf)?,
		},
		4 => ManagementBody::ProbeRequest,
		5 => ManagementBody::ProbeResponse {
			timestamp: read_u64(buf)?,
			interval: read_u16(buf)?,
			capabilities: Capability::from_bits(read_u16(buf)?),
		},
		8 => ManagementBody::Beacon {
			timestamp: read_u64(buf)?,
			interval: read_u16(buf)?,
			capabilities: Capability::from_bits(read_u16(buf)?),
		},
		10 => ManagementBody::Disassoc {
			reason_code: read_u16(buf)?,
		},
		11 => ManagementBody::Authentication {
			auth_algorithm: read_u16(buf)?,
			auth_seq_number: read_u16(buf)?,
			status_code: read_u16(buf)?,
		},
		_ => ManagementBody::Deauthentication {
			reason_code: read_u16(buf)?,
		},
	};

	Some(Ok(Dot11::Management(ManagementFrame {
		header,
		mgmt_header: MgmtHeader {
			frag_num,
			seq_num,
			addr2,
			addr3,
			addr4,
		},
		body,
	})))
}

fn control(bytes: &[u8], subtype: u8) -> Option<Parsed> {
	let mut buf = bytes;
	let header = header(&mut buf)?;
	let body = match subtype {
		8 | 9 => {
			// transmitter address precedes the block ack fields
			read_mac(&mut buf)?;
			let bar_control = read_u16(&mut buf)?;
			let start = read_u16(&mut buf)?;
			let info = BlockAckInfo {
				bar_control: bar_control & 0x0f,
				start_seq: start >> 4,
				frag_num: (start & 0x0f) as u8,
			};
			if subtype == 8 {
				ControlBody::BlockAckRequest(info)
			} else {
				ControlBody::BlockAck(info)
			}
		}
		10 | 11 | 14 | 15 => {
			read_mac(&mut buf)?;
			match subtype {
				10 => ControlBody::PsPoll,
				11 => ControlBody::Rts,
				14 => ControlBody::CfEnd,
				_ => ControlBody::EndCfAck,
			}
		}
		13 => ControlBody::Ack,
		12 => return Some(Err("DOT11_CTS")),
		7 => return Some(Err("DOT11_CONTROL_WRAPPER")),
		_ => return Some(Err("DOT11_RESERVED")),
	};
	Some(Ok(Dot11::Control(ControlFrame { header, body })))
}

fn data(bytes: &[u8], subtype: u8) -> Option<Parsed> {
	let mut buf = bytes;
	let header = header(&mut buf)?;
	let (frag_num, seq_num, [addr2, addr3, addr4]) = addresses(&mut buf, &header)?;
	let body = if subtype & 0x08 != 0 {
		DataBody::QosData {
			qos_control: read_u16(&mut buf)?,
		}
	} else {
		DataBody::Data
	};
	Some(Ok(Dot11::Data(DataFrame {
		header,
		data_header: DataHeader {
			frag_num,
			seq_num,
			addr2,
			addr3,
			addr4,
		},
		body,
	})))
}
