use super::KvClient;
use crate::protocol::{
    Command, DriverError, ErrorInfo, PartitionFilter, QueryPolicy, Record, Response, ScanPolicy,
    Statement,
};

/// One streamed item: either a record or a per-record store error.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEntry {
    pub record: Option<Record>,
    pub error: Option<ErrorInfo>,
    pub bval: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StreamOutput {
    pub entries: Vec<StreamEntry>,
    /// Set when the scan or query could not be started
    pub error: Option<ErrorInfo>,
}

impl StreamOutput {
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.entries.iter().filter_map(|e| e.record.as_ref())
    }
}

impl KvClient {
    pub async fn scan(
        &mut self,
        policy: Option<ScanPolicy>,
        partition_filter: Option<PartitionFilter>,
        namespace: &str,
        set_name: &str,
        bin_names: &[&str],
    ) -> Result<StreamOutput, DriverError> {
        let frames = self
            .send_streaming(Command::Scan {
                policy,
                partition_filter,
                namespace: namespace.to_string(),
                set_name: set_name.to_string(),
                bin_names: bin_names.iter().map(|s| s.to_string()).collect(),
            })
            .await?;
        Self::collect_stream(frames)
    }

    pub async fn query(
        &mut self,
        policy: Option<QueryPolicy>,
        statement: Statement,
        partition_filter: Option<PartitionFilter>,
    ) -> Result<StreamOutput, DriverError> {
        let frames = self
            .send_streaming(Command::Query {
                policy,
                statement,
                partition_filter,
            })
            .await?;
        Self::collect_stream(frames)
    }

    fn collect_stream(frames: Vec<Response>) -> Result<StreamOutput, DriverError> {
        let mut output = StreamOutput::default();
        for frame in frames {
            match frame {
                Response::StreamItem {
                    record,
                    error,
                    bval,
                } => output.entries.push(StreamEntry {
                    record,
                    error,
                    bval,
                }),
                Response::StreamEnd { error } => output.error = error,
                other => return Err(Self::unexpected(other)),
            }
        }
        Ok(output)
    }
}
