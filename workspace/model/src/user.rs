use serde::{Deserialize, Serialize};
use url::Url;

use crate::audit::{AuditInfo, Auditable};
use crate::entities::{character, user, user_equipment};
use crate::entities::user::Role;

/// Identity of a user row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i32);

/// Identity of a character row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterId(pub i32);

/// Identity of an equipment instance row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserEquipmentId(pub i32);

impl From<&character::Model> for CharacterId {
    fn from(model: &character::Model) -> Self {
        CharacterId(model.id)
    }
}

impl From<&user_equipment::Model> for UserEquipmentId {
    fn from(model: &user_equipment::Model) -> Self {
        UserEquipmentId(model.id)
    }
}

/// In-memory account record.
///
/// Plain value container: every field except the identity and the persisted
/// version is freely readable and writable. Owned characters and equipment are
/// held as ids and resolved through the service layer, so the record never
/// points back into a graph of live objects.
///
/// Nothing here validates or persists. Money non-negativity, role changes and
/// ownership transfers are enforced where the record is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    version: i32,
    pub steam_id: i64,
    pub user_name: String,
    pub money: i32,
    pub role: Role,
    /// 32x32
    pub avatar_small: Option<Url>,
    /// 64x64
    pub avatar_medium: Option<Url>,
    /// 184x184
    pub avatar_full: Option<Url>,
    pub user_equipments: Vec<UserEquipmentId>,
    pub characters: Vec<CharacterId>,
    pub audit: AuditInfo,
}

impl User {
    /// A freshly provisioned account: no money, no avatars, nothing owned.
    pub fn new(id: UserId, steam_id: i64, user_name: impl Into<String>, audit: AuditInfo) -> Self {
        Self {
            id,
            version: 1,
            steam_id,
            user_name: user_name.into(),
            money: 0,
            role: Role::default(),
            avatar_small: None,
            avatar_medium: None,
            avatar_full: None,
            user_equipments: Vec::new(),
            characters: Vec::new(),
            audit,
        }
    }

    /// Builds the record from a stored row plus its resolved ownership edges.
    ///
    /// Fails if a stored avatar is not a valid URL.
    pub fn from_parts(
        model: user::Model,
        user_equipments: Vec<UserEquipmentId>,
        characters: Vec<CharacterId>,
    ) -> Result<Self, url::ParseError> {
        let audit = model.audit_info();
        Ok(Self {
            id: UserId(model.id),
            version: model.version,
            steam_id: model.steam_id,
            user_name: model.user_name,
            money: model.money,
            role: model.role,
            avatar_small: parse_avatar(model.avatar_small.as_deref())?,
            avatar_medium: parse_avatar(model.avatar_medium.as_deref())?,
            avatar_full: parse_avatar(model.avatar_full.as_deref())?,
            user_equipments,
            characters,
            audit,
        })
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    /// Version of the row this record was read from.
    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn owns_character(&self, id: CharacterId) -> bool {
        self.characters.contains(&id)
    }

    pub fn owns_user_equipment(&self, id: UserEquipmentId) -> bool {
        self.user_equipments.contains(&id)
    }

    /// Appends a character id. Returns false if it was already present.
    pub fn add_character(&mut self, id: CharacterId) -> bool {
        if self.owns_character(id) {
            return false;
        }
        self.characters.push(id);
        true
    }

    /// Removes a character id from the in-memory collection only.
    pub fn remove_character(&mut self, id: CharacterId) -> bool {
        let before = self.characters.len();
        self.characters.retain(|c| *c != id);
        before != self.characters.len()
    }

    /// Appends an equipment id. Returns false if it was already present.
    pub fn add_user_equipment(&mut self, id: UserEquipmentId) -> bool {
        if self.owns_user_equipment(id) {
            return false;
        }
        self.user_equipments.push(id);
        true
    }

    /// Removes an equipment id from the in-memory collection only.
    pub fn remove_user_equipment(&mut self, id: UserEquipmentId) -> bool {
        let before = self.user_equipments.len();
        self.user_equipments.retain(|e| *e != id);
        before != self.user_equipments.len()
    }
}

impl Auditable for User {
    fn audit_info(&self) -> AuditInfo {
        self.audit.clone()
    }
}

fn parse_avatar(value: Option<&str>) -> Result<Option<Url>, url::ParseError> {
    value.map(Url::parse).transpose()
}
