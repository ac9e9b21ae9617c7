use super::KvClient;
use crate::protocol::{
    Bin, Command, DriverError, ErrorInfo, Key, Operation, ReadPolicy, Record, Response,
    WritePolicy,
};

impl KvClient {
    pub async fn get(
        &mut self,
        key: Key,
        bin_names: &[&str],
    ) -> Result<(Option<Record>, Option<ErrorInfo>), DriverError> {
        self.get_with_policy(None, key, bin_names).await
    }

    pub async fn get_with_policy(
        &mut self,
        policy: Option<ReadPolicy>,
        key: Key,
        bin_names: &[&str],
    ) -> Result<(Option<Record>, Option<ErrorInfo>), DriverError> {
        let response = self
            .send_command(Command::Get {
                policy,
                key,
                bin_names: bin_names.iter().map(|s| s.to_string()).collect(),
            })
            .await?;
        Self::extract_single(response)
    }

    pub async fn get_header(
        &mut self,
        key: Key,
    ) -> Result<(Option<Record>, Option<ErrorInfo>), DriverError> {
        let response = self
            .send_command(Command::GetHeader { policy: None, key })
            .await?;
        Self::extract_single(response)
    }

    pub async fn exists(&mut self, key: Key) -> Result<(bool, Option<ErrorInfo>), DriverError> {
        match self.send_command(Command::Exists { policy: None, key }).await? {
            Response::Exists { exists, error } => Ok((exists, error)),
            other => Err(Self::unexpected(other)),
        }
    }

    pub async fn put(&mut self, key: Key, bins: Vec<Bin>) -> Result<Option<ErrorInfo>, DriverError> {
        self.put_with_policy(None, key, bins).await
    }

    pub async fn put_with_policy(
        &mut self,
        policy: Option<WritePolicy>,
        key: Key,
        bins: Vec<Bin>,
    ) -> Result<Option<ErrorInfo>, DriverError> {
        let response = self.send_command(Command::Put { policy, key, bins }).await?;
        Self::extract_status(response)
    }

    pub async fn add(&mut self, key: Key, bins: Vec<Bin>) -> Result<Option<ErrorInfo>, DriverError> {
        let response = self
            .send_command(Command::Add {
                policy: None,
                key,
                bins,
            })
            .await?;
        Self::extract_status(response)
    }

    pub async fn append(
        &mut self,
        key: Key,
        bins: Vec<Bin>,
    ) -> Result<Option<ErrorInfo>, DriverError> {
        let response = self
            .send_command(Command::Append {
                policy: None,
                key,
                bins,
            })
            .await?;
        Self::extract_status(response)
    }

    pub async fn prepend(
        &mut self,
        key: Key,
        bins: Vec<Bin>,
    ) -> Result<Option<ErrorInfo>, DriverError> {
        let response = self
            .send_command(Command::Prepend {
                policy: None,
                key,
                bins,
            })
            .await?;
        Self::extract_status(response)
    }

    pub async fn delete(&mut self, key: Key) -> Result<(bool, Option<ErrorInfo>), DriverError> {
        match self.send_command(Command::Delete { policy: None, key }).await? {
            Response::Delete { existed, error } => Ok((existed, error)),
            other => Err(Self::unexpected(other)),
        }
    }

    pub async fn touch(&mut self, key: Key) -> Result<Option<ErrorInfo>, DriverError> {
        let response = self.send_command(Command::Touch { policy: None, key }).await?;
        Self::extract_status(response)
    }

    pub async fn operate(
        &mut self,
        key: Key,
        operations: Vec<Operation>,
    ) -> Result<(Option<Record>, Option<ErrorInfo>), DriverError> {
        let response = self
            .send_command(Command::Operate {
                policy: None,
                key,
                operations,
            })
            .await?;
        Self::extract_single(response)
    }

    fn extract_single(
        response: Response,
    ) -> Result<(Option<Record>, Option<ErrorInfo>), DriverError> {
        match response {
            Response::Single { record, error } => Ok((record, error)),
            other => Err(Self::unexpected(other)),
        }
    }
}
