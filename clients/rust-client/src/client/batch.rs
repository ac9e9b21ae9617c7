use super::KvClient;
use crate::protocol::{
    BatchOperate, BatchPolicy, BatchRecord, Command, DriverError, ErrorInfo, Response,
};

impl KvClient {
    /// Runs a batch. Per-record outcomes are in each `BatchRecord::error`;
    /// the second element is the outcome of the batch call as a whole.
    pub async fn batch_operate(
        &mut self,
        policy: Option<BatchPolicy>,
        records: Vec<BatchOperate>,
    ) -> Result<(Vec<BatchRecord>, Option<ErrorInfo>), DriverError> {
        match self
            .send_command(Command::BatchOperate { policy, records })
            .await?
        {
            Response::Batch { records, error } => Ok((records, error)),
            other => Err(Self::unexpected(other)),
        }
    }
}
