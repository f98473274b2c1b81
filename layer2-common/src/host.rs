//! Asynchronous host surface.
//!
//! [`CaptureHandle`] runs each dispatch on the blocking pool and hands the
//! buffer back with the result, so a host event loop never waits on the
//! capture source.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use snafu::ResultExt;
use tokio::task::JoinHandle;

use layer2_core::CaptureSource;

use crate::config::SessionConfig;
use crate::session::Session;
use crate::{Result, error};

#[derive(Clone)]
pub struct CaptureHandle {
	session: Arc<Session>,
}

impl CaptureHandle {
	pub fn new(session: Session) -> Self {
		Self {
			session: Arc::new(session),
		}
	}

	/// Opens a stored capture on the blocking pool.
	pub async fn from_file(path: impl AsRef<Path>, config: SessionConfig) -> Result<Self> {
		let path: PathBuf = path.as_ref().to_path_buf();
		let session = tokio::task::spawn_blocking(move || Session::from_file(path, config))
			.await
			.context(error::WorkerPanickedSnafu)??;
		Ok(Self::new(session))
	}

	/// Opens a live interface on the blocking pool.
	#[cfg(feature = "live")]
	pub async fn from_interface(interface: &str, config: SessionConfig) -> Result<Self> {
		let interface = interface.to_owned();
		let session = tokio::task::spawn_blocking(move || Session::from_interface(&interface, config))
			.await
			.context(error::WorkerPanickedSnafu)??;
		Ok(Self::new(session))
	}

	pub fn from_source(source: impl CaptureSource + 'static, config: SessionConfig) -> Result<Self> {
		Session::from_source(source, config).map(Self::new)
	}

	pub fn session(&self) -> &Arc<Session> { &self.session }

	/// Starts a dispatch into `buffer` and returns at once.
	///
	/// `callback` runs exactly once on a runtime task, with the outcome and
	/// the buffer, whose first records hold the encoded frames on success. A
	/// worker that panics is reported as [`Error::WorkerPanicked`].
	///
	/// [`Error::WorkerPanicked`]: crate::Error::WorkerPanicked
	pub fn dispatch<F>(&self, buffer: Vec<u8>, callback: F) -> JoinHandle<()>
	where
		F: FnOnce(Result<usize>, Vec<u8>) + Send + 'static,
	{
		let handle = self.clone();
		tokio::spawn(async move {
			let (result, buffer) = handle.dispatch_async(buffer).await;
			callback(result, buffer);
		})
	}

	/// Dispatch and wait for the outcome.
	pub async fn dispatch_async(&self, mut buffer: Vec<u8>) -> (Result<usize>, Vec<u8>) {
		let session = Arc::clone(&self.session);
		let len = buffer.len();
		let task = tokio::task::spawn_blocking(move || {
			let result = session.dispatch(&mut buffer);
			(result, buffer)
		});
		match task.await {
			Ok(outcome) => outcome,
			Err(source) => (Err(source).context(error::WorkerPanickedSnafu), vec![0; len]),
		}
	}

	pub fn break_loop(&self) { self.session.break_loop(); }

	/// Closes the session without blocking the caller; waits for an in-flight
	/// dispatch on the blocking pool.
	pub async fn close(&self) -> Result<()> {
		let session = Arc::clone(&self.session);
		tokio::task::spawn_blocking(move || session.close())
			.await
			.context(error::WorkerPanickedSnafu)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::Error;
	use layer2_core::LinkType;
	use layer2_core::capture::{MemorySource, RawFrame};
	use layer2_core::codec::read_records;
	use std::time::Duration;

	fn source(count: u8) -> MemorySource {
		MemorySource::new(
			LinkType::ETHERNET,
			(0..count).map(|i| RawFrame::new(LinkType::ETHERNET, vec![i; 32], Duration::from_millis(u64::from(i)))),
		)
	}

	#[tokio::test]
	async fn test_callback_receives_buffer() {
		let handle = CaptureHandle::from_source(source(2), SessionConfig::default()).unwrap();
		let (tx, rx) = tokio::sync::oneshot::channel();
		handle
			.dispatch(vec![0; 4096], move |result, buffer| {
				let _ = tx.send((result, buffer));
			})
			.await
			.unwrap();

		let (result, buffer) = rx.await.unwrap();
		assert_eq!(result.unwrap(), 2);
		let records = read_records(&buffer, 2).unwrap();
		assert_eq!(records[1].timestamp_ms, 1);
	}

	struct PanickingSource;

	impl CaptureSource for PanickingSource {
		fn link_type(&self) -> LinkType { LinkType::ETHERNET }

		fn snaplen(&self) -> u32 { 65535 }

		fn next_frame(&mut self) -> layer2_core::Result<Option<RawFrame>> { panic!("capture engine crashed") }

		fn stats(&mut self) -> layer2_core::Result<layer2_core::capture::CaptureStats> { Ok(Default::default()) }
	}

	#[tokio::test]
	async fn test_callback_runs_when_worker_panics() {
		let handle = CaptureHandle::from_source(PanickingSource, SessionConfig::default()).unwrap();
		let (tx, rx) = tokio::sync::oneshot::channel();
		handle
			.dispatch(vec![0; 256], move |result, buffer| {
				let _ = tx.send((result, buffer));
			})
			.await
			.unwrap();

		let (result, buffer) = rx.await.unwrap();
		assert!(matches!(result, Err(Error::WorkerPanicked { .. })));
		assert_eq!(buffer.len(), 256);
		// the single-flight guard was released during unwinding
		assert!(!handle.session().is_dispatching());
	}

	#[tokio::test]
	async fn test_dispatch_after_close() {
		let handle = CaptureHandle::from_source(source(1), SessionConfig::default()).unwrap();
		let (result, buffer) = handle.dispatch_async(vec![0; 1024]).await;
		assert_eq!(result.unwrap(), 1);
		handle.close().await.unwrap();

		let (result, _) = handle.dispatch_async(buffer).await;
		assert!(matches!(result, Err(Error::InactiveSession)));
	}

	#[tokio::test]
	async fn test_from_missing_file() {
		let result = CaptureHandle::from_file("/nonexistent/capture.pcap", SessionConfig::default()).await;
		assert!(matches!(result, Err(Error::Config { .. })));
	}
}
