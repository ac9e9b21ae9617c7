use super::DriverError;
use super::KvClient;

pub struct KvClientBuilder {
    path: String,
    pool_size: Option<usize>,
}

impl KvClientBuilder {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            pool_size: None,
        }
    }

    pub fn pool_size(mut self, size: usize) -> Self {
        self.pool_size = Some(size);
        self
    }

    pub async fn build(self) -> Result<KvClient, DriverError> {
        match self.pool_size {
            Some(size) => KvClient::connect_with_pool(&self.path, size).await,
            None => KvClient::connect(&self.path).await,
        }
    }
}
