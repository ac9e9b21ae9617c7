use super::KvClient;
use crate::protocol::{
    Command, DriverError, ErrorInfo, IndexCollectionType, IndexType, Key, Privilege, Response,
    Role, UdfLanguage, UdfMeta, UserRole, Value,
};

impl KvClient {
    // ==================== Indexes & Truncate ====================

    pub async fn create_index(
        &mut self,
        namespace: &str,
        set_name: &str,
        index_name: &str,
        bin_name: &str,
        index_type: IndexType,
        index_collection_type: IndexCollectionType,
    ) -> Result<Option<ErrorInfo>, DriverError> {
        let response = self
            .send_command(Command::CreateIndex {
                policy: None,
                namespace: namespace.to_string(),
                set_name: set_name.to_string(),
                index_name: index_name.to_string(),
                bin_name: bin_name.to_string(),
                index_type,
                index_collection_type,
            })
            .await?;
        Self::extract_status(response)
    }

    pub async fn drop_index(
        &mut self,
        namespace: &str,
        set_name: &str,
        index_name: &str,
    ) -> Result<Option<ErrorInfo>, DriverError> {
        let response = self
            .send_command(Command::DropIndex {
                policy: None,
                namespace: namespace.to_string(),
                set_name: set_name.to_string(),
                index_name: index_name.to_string(),
            })
            .await?;
        Self::extract_status(response)
    }

    pub async fn truncate(
        &mut self,
        namespace: &str,
        set_name: &str,
        before_nanos: Option<i64>,
    ) -> Result<Option<ErrorInfo>, DriverError> {
        let response = self
            .send_command(Command::Truncate {
                policy: None,
                namespace: namespace.to_string(),
                set_name: set_name.to_string(),
                before_nanos,
            })
            .await?;
        Self::extract_status(response)
    }

    // ==================== UDF ====================

    pub async fn register_udf(
        &mut self,
        udf_body: &[u8],
        package_name: &str,
    ) -> Result<Option<ErrorInfo>, DriverError> {
        let response = self
            .send_command(Command::RegisterUdf {
                policy: None,
                udf_body: udf_body.to_vec(),
                package_name: package_name.to_string(),
                language: UdfLanguage::Lua,
            })
            .await?;
        Self::extract_status(response)
    }

    pub async fn drop_udf(&mut self, package_name: &str) -> Result<Option<ErrorInfo>, DriverError> {
        let response = self
            .send_command(Command::DropUdf {
                policy: None,
                package_name: package_name.to_string(),
            })
            .await?;
        Self::extract_status(response)
    }

    pub async fn list_udf(&mut self) -> Result<(Vec<UdfMeta>, Option<ErrorInfo>), DriverError> {
        match self.send_command(Command::ListUdf { policy: None }).await? {
            Response::UdfList { udfs, error } => Ok((udfs, error)),
            other => Err(Self::unexpected(other)),
        }
    }

    pub async fn udf_execute(
        &mut self,
        key: Key,
        package_name: &str,
        function_name: &str,
        args: Vec<Value>,
    ) -> Result<(Option<Value>, Option<ErrorInfo>), DriverError> {
        match self
            .send_command(Command::UdfExecute {
                policy: None,
                key,
                package_name: package_name.to_string(),
                function_name: function_name.to_string(),
                args,
            })
            .await?
        {
            Response::UdfResult { result, error } => Ok((result, error)),
            other => Err(Self::unexpected(other)),
        }
    }

    // ==================== Users & Roles ====================

    pub async fn create_user(
        &mut self,
        user: &str,
        password: &str,
        roles: &[&str],
    ) -> Result<Option<ErrorInfo>, DriverError> {
        let response = self
            .send_command(Command::CreateUser {
                policy: None,
                user: user.to_string(),
                password: password.to_string(),
                roles: roles.iter().map(|s| s.to_string()).collect(),
            })
            .await?;
        Self::extract_status(response)
    }

    pub async fn drop_user(&mut self, user: &str) -> Result<Option<ErrorInfo>, DriverError> {
        let response = self
            .send_command(Command::DropUser {
                policy: None,
                user: user.to_string(),
            })
            .await?;
        Self::extract_status(response)
    }

    pub async fn grant_roles(
        &mut self,
        user: &str,
        roles: &[&str],
    ) -> Result<Option<ErrorInfo>, DriverError> {
        let response = self
            .send_command(Command::GrantRoles {
                policy: None,
                user: user.to_string(),
                roles: roles.iter().map(|s| s.to_string()).collect(),
            })
            .await?;
        Self::extract_status(response)
    }

    pub async fn query_users(
        &mut self,
        user: Option<&str>,
    ) -> Result<(Vec<UserRole>, Option<ErrorInfo>), DriverError> {
        match self
            .send_command(Command::QueryUsers {
                policy: None,
                user: user.map(|s| s.to_string()),
            })
            .await?
        {
            Response::Users { users, error } => Ok((users, error)),
            other => Err(Self::unexpected(other)),
        }
    }

    pub async fn create_role(
        &mut self,
        role_name: &str,
        privileges: Vec<Privilege>,
    ) -> Result<Option<ErrorInfo>, DriverError> {
        let response = self
            .send_command(Command::CreateRole {
                policy: None,
                role_name: role_name.to_string(),
                privileges,
                allowlist: Vec::new(),
                read_quota: 0,
                write_quota: 0,
            })
            .await?;
        Self::extract_status(response)
    }

    pub async fn query_roles(
        &mut self,
        role_name: Option<&str>,
    ) -> Result<(Vec<Role>, Option<ErrorInfo>), DriverError> {
        match self
            .send_command(Command::QueryRoles {
                policy: None,
                role_name: role_name.map(|s| s.to_string()),
            })
            .await?
        {
            Response::Roles { roles, error } => Ok((roles, error)),
            other => Err(Self::unexpected(other)),
        }
    }
}
