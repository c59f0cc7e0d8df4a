//! Relational layout for exported starred repositories.

pub const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS owners (
    id INTEGER PRIMARY KEY,
    login TEXT NOT NULL,
    node_id TEXT NOT NULL,
    avatar_url TEXT NOT NULL,
    gravatar_id TEXT NOT NULL,
    url TEXT NOT NULL,
    html_url TEXT NOT NULL,
    followers_url TEXT NOT NULL,
    following_url TEXT NOT NULL,
    gists_url TEXT NOT NULL,
    starred_url TEXT NOT NULL,
    subscriptions_url TEXT NOT NULL,
    organizations_url TEXT NOT NULL,
    repos_url TEXT NOT NULL,
    events_url TEXT NOT NULL,
    received_events_url TEXT NOT NULL,
    type TEXT NOT NULL,
    user_view_type TEXT,
    site_admin INTEGER NOT NULL
);

-- Licenses and permissions have no id of their own in the API; rows are
-- shared by matching every column (NULL-aware)
CREATE TABLE IF NOT EXISTS licenses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    key TEXT,
    name TEXT,
    spdx_id TEXT,
    url TEXT,
    node_id TEXT
);

CREATE TABLE IF NOT EXISTS permissions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    admin INTEGER,
    maintain INTEGER,
    push INTEGER,
    triage INTEGER,
    pull INTEGER
);

CREATE TABLE IF NOT EXISTS repositories (
    id INTEGER PRIMARY KEY,
    node_id TEXT NOT NULL,
    name TEXT NOT NULL,
    full_name TEXT NOT NULL,
    private INTEGER NOT NULL,
    owner_id INTEGER NOT NULL REFERENCES owners(id),
    html_url TEXT NOT NULL,
    description TEXT,
    fork INTEGER NOT NULL,
    url TEXT NOT NULL,
    created_at TEXT,
    updated_at TEXT,
    pushed_at TEXT,
    git_url TEXT NOT NULL,
    ssh_url TEXT NOT NULL,
    clone_url TEXT NOT NULL,
    svn_url TEXT NOT NULL,
    homepage TEXT,
    size INTEGER NOT NULL,
    stargazers_count INTEGER NOT NULL,
    watchers_count INTEGER NOT NULL,
    language TEXT,
    has_issues INTEGER NOT NULL,
    has_projects INTEGER NOT NULL,
    has_downloads INTEGER NOT NULL,
    has_wiki INTEGER NOT NULL,
    has_pages INTEGER NOT NULL,
    has_discussions INTEGER NOT NULL,
    forks_count INTEGER NOT NULL,
    mirror_url TEXT,
    archived INTEGER NOT NULL,
    disabled INTEGER NOT NULL,
    open_issues_count INTEGER NOT NULL,
    license_id INTEGER REFERENCES licenses(id),
    allow_forking INTEGER NOT NULL,
    is_template INTEGER NOT NULL,
    web_commit_signoff_required INTEGER NOT NULL,
    topics TEXT NOT NULL,
    visibility TEXT NOT NULL,
    forks INTEGER NOT NULL,
    open_issues INTEGER NOT NULL,
    watchers INTEGER NOT NULL,
    default_branch TEXT NOT NULL,
    permissions_id INTEGER REFERENCES permissions(id)
);

CREATE INDEX IF NOT EXISTS idx_repositories_owner ON repositories(owner_id);
CREATE INDEX IF NOT EXISTS idx_repositories_license ON repositories(license_id);
CREATE INDEX IF NOT EXISTS idx_repositories_permissions ON repositories(permissions_id);
"#;
