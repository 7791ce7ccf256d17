use mongodb::{options::ClientOptions, Client, Collection, Database};

use crate::models::{
    Approval, Board, Comment, Contract, Negotiation, Notification, Project, Proposal,
    SystemSetting, User,
};

pub struct MongoDB {
    pub client: Client,
    pub db: Database,
}

impl MongoDB {
    pub async fn init(uri: &str, db_name: &str) -> Self {
        let client_options = ClientOptions::parse(uri)
            .await
            .expect("Failed to parse MongoDB connection string");
        let client = Client::with_options(client_options).expect("Failed to initialize client");
        let db = client.database(db_name);
        MongoDB { client, db }
    }

    pub fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    pub fn projects(&self) -> Collection<Project> {
        self.db.collection("projects")
    }

    pub fn proposals(&self) -> Collection<Proposal> {
        self.db.collection("proposals")
    }

    pub fn negotiations(&self) -> Collection<Negotiation> {
        self.db.collection("negotiations")
    }

    pub fn approvals(&self) -> Collection<Approval> {
        self.db.collection("approvals")
    }

    pub fn contracts(&self) -> Collection<Contract> {
        self.db.collection("contracts")
    }

    pub fn boards(&self) -> Collection<Board> {
        self.db.collection("boards")
    }

    pub fn comments(&self) -> Collection<Comment> {
        self.db.collection("comments")
    }

    pub fn notifications(&self) -> Collection<Notification> {
        self.db.collection("notifications")
    }

    pub fn system_settings(&self) -> Collection<SystemSetting> {
        self.db.collection("system_settings")
    }
}
