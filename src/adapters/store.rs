use crate::domain::model::{Member, MemberId};
use crate::domain::ports::MemberStore;
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct InMemoryMemberStore {
    members: Vec<Member>,
}

impl InMemoryMemberStore {
    pub fn new(members: Vec<Member>) -> Self {
        Self { members }
    }
}

impl MemberStore for InMemoryMemberStore {
    async fn list_members(&self) -> Result<Vec<Member>> {
        Ok(self.members.clone())
    }

    async fn get_member(&self, id: MemberId) -> Result<Option<Member>> {
        Ok(self.members.iter().find(|m| m.id == id).cloned())
    }
}

/// 會員匯出檔（JSON 陣列）。每次讀取都重新載入，反映外部 CRUD 的最新狀態。
#[derive(Debug, Clone)]
pub struct JsonFileMemberStore {
    path: PathBuf,
}

impl JsonFileMemberStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl MemberStore for JsonFileMemberStore {
    async fn list_members(&self) -> Result<Vec<Member>> {
        let data = tokio::fs::read(&self.path).await?;
        let members: Vec<Member> = serde_json::from_slice(&data)?;
        tracing::debug!("Loaded {} members from {}", members.len(), self.path.display());
        Ok(members)
    }

    async fn get_member(&self, id: MemberId) -> Result<Option<Member>> {
        Ok(self.list_members().await?.into_iter().find(|m| m.id == id))
    }
}

/// 會員匯出檔（CSV，欄位名稱與 [`Member`] 相同，`start_date` 可留空）
#[derive(Debug, Clone)]
pub struct CsvFileMemberStore {
    path: PathBuf,
}

impl CsvFileMemberStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn parse(data: &[u8]) -> Result<Vec<Member>> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(data);
        let mut members = Vec::new();
        for row in reader.deserialize::<Member>() {
            members.push(row?);
        }
        Ok(members)
    }
}

impl MemberStore for CsvFileMemberStore {
    async fn list_members(&self) -> Result<Vec<Member>> {
        let data = tokio::fs::read(&self.path).await?;
        let members = Self::parse(&data)?;
        tracing::debug!("Loaded {} members from {}", members.len(), self.path.display());
        Ok(members)
    }

    async fn get_member(&self, id: MemberId) -> Result<Option<Member>> {
        Ok(self.list_members().await?.into_iter().find(|m| m.id == id))
    }
}

/// 依副檔名選擇 JSON 或 CSV
#[derive(Debug, Clone)]
pub enum FileMemberStore {
    Json(JsonFileMemberStore),
    Csv(CsvFileMemberStore),
}

impl FileMemberStore {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => {
                FileMemberStore::Csv(CsvFileMemberStore::new(path))
            }
            _ => FileMemberStore::Json(JsonFileMemberStore::new(path)),
        }
    }
}

impl MemberStore for FileMemberStore {
    async fn list_members(&self) -> Result<Vec<Member>> {
        match self {
            FileMemberStore::Json(store) => store.list_members().await,
            FileMemberStore::Csv(store) => store.list_members().await,
        }
    }

    async fn get_member(&self, id: MemberId) -> Result<Option<Member>> {
        match self {
            FileMemberStore::Json(store) => store.get_member(id).await,
            FileMemberStore::Csv(store) => store.get_member(id).await,
        }
    }
}
