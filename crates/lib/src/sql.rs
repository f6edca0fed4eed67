//! Quoting helpers and MySQL account statement builders
//!
//! Account management statements (`CREATE USER`, `GRANT`, ...) cannot take placeholders for
//! account names or passwords, so every identifier and literal is escaped here instead. Builders
//! produce a [`Statement`] carrying both the executable text and a redacted form safe for logs and
//! reports.
//!
//! ```
//! use accord::identity::parse;
//! use accord::privileges::Scope;
//! use accord::sql::GrantStatement;
//!
//! let account = parse("router@%").unwrap();
//! let stmt = GrantStatement::new(&account, Scope::Schema("app".into()))
//!     .privilege("SELECT")
//!     .privilege("EXECUTE")
//!     .build();
//! assert_eq!(stmt.sql(), "GRANT SELECT, EXECUTE ON `app`.* TO 'router'@'%'");
//! ```

use std::fmt;

use serde::{Serialize, Serializer};

use crate::identity::AccountIdentity;
use crate::options::{PasswordExpiration, Secret};
use crate::privileges::Scope;

/// Placeholder printed instead of password literals.
pub const REDACTED: &str = "****";

/// Quote a string literal, escaping the characters the server treats specially.
pub fn quote_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        match c {
            '\'' => quoted.push_str("\\'"),
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\0' => quoted.push_str("\\0"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\x1a' => quoted.push_str("\\Z"),
            c => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}

/// Quote an identifier with backticks, doubling embedded backticks.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// A rendered statement that takes no bound parameters.
#[derive(Clone, PartialEq, Eq)]
pub struct Statement {
    sql: String,
    redacted: String,
}

impl Statement {
    fn new(sql: String, redacted: String) -> Self {
        Self { sql, redacted }
    }

    fn plain(sql: String) -> Self {
        Self {
            redacted: sql.clone(),
            sql,
        }
    }

    /// The text to execute. May contain secrets.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The text with password literals replaced by [`REDACTED`].
    pub fn redacted(&self) -> &str {
        &self.redacted
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted)
    }
}

impl fmt::Debug for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Statement").field(&self.redacted).finish()
    }
}

impl Serialize for Statement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.redacted)
    }
}

/// X.509 requirements for an account. Empty strings mean "no requirement".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertRequirement {
    pub issuer: String,
    pub subject: String,
}

impl CertRequirement {
    pub fn is_none(&self) -> bool {
        self.issuer.is_empty() && self.subject.is_empty()
    }
}

impl fmt::Display for CertRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return f.write_str("REQUIRE NONE");
        }
        f.write_str("REQUIRE")?;
        let mut first = true;
        for (keyword, value) in [("ISSUER", &self.issuer), ("SUBJECT", &self.subject)] {
            if value.is_empty() {
                continue;
            }
            if !first {
                f.write_str(" AND")?;
            }
            write!(f, " {keyword} {}", quote_string(value))?;
            first = false;
        }
        Ok(())
    }
}

/// Authentication clauses shared by `CREATE USER` and `ALTER USER`.
#[derive(Debug, Clone, Default)]
struct AuthClauses {
    password: Option<Secret>,
    require: Option<CertRequirement>,
    expire: Option<PasswordExpiration>,
}

impl AuthClauses {
    fn is_empty(&self) -> bool {
        self.password.is_none() && self.require.is_none() && self.expire.is_none()
    }

    /// Append the clauses to both the executable and the redacted text.
    fn render(&self, sql: &mut String, redacted: &mut String) {
        if let Some(password) = &self.password {
            sql.push_str(" IDENTIFIED BY ");
            sql.push_str(&quote_string(password.expose()));
            redacted.push_str(" IDENTIFIED BY ");
            redacted.push_str(&quote_string(REDACTED));
        }
        let mut tail = String::new();
        if let Some(require) = &self.require {
            tail.push(' ');
            tail.push_str(&require.to_string());
        }
        if let Some(expire) = &self.expire {
            tail.push_str(" PASSWORD EXPIRE ");
            tail.push_str(&expire.to_string());
        }
        sql.push_str(&tail);
        redacted.push_str(&tail);
    }
}

/// CREATE USER statement builder
#[derive(Debug, Clone)]
pub struct CreateUserStatement<'a> {
    account: &'a AccountIdentity,
    auth: AuthClauses,
}

impl<'a> CreateUserStatement<'a> {
    pub fn new(account: &'a AccountIdentity) -> Self {
        Self {
            account,
            auth: AuthClauses::default(),
        }
    }

    pub fn password(mut self, password: Secret) -> Self {
        self.auth.password = Some(password);
        self
    }

    pub fn require(mut self, require: CertRequirement) -> Self {
        self.auth.require = Some(require);
        self
    }

    pub fn password_expire(mut self, policy: PasswordExpiration) -> Self {
        self.auth.expire = Some(policy);
        self
    }

    pub fn build(&self) -> Statement {
        let mut sql = format!("CREATE USER {}", self.account);
        let mut redacted = sql.clone();
        self.auth.render(&mut sql, &mut redacted);
        Statement::new(sql, redacted)
    }
}

/// ALTER USER statement builder
#[derive(Debug, Clone)]
pub struct AlterUserStatement<'a> {
    account: &'a AccountIdentity,
    auth: AuthClauses,
}

impl<'a> AlterUserStatement<'a> {
    pub fn new(account: &'a AccountIdentity) -> Self {
        Self {
            account,
            auth: AuthClauses::default(),
        }
    }

    /// Set a new password. An empty secret clears the password.
    pub fn password(mut self, password: Secret) -> Self {
        self.auth.password = Some(password);
        self
    }

    pub fn require(mut self, require: CertRequirement) -> Self {
        self.auth.require = Some(require);
        self
    }

    pub fn password_expire(mut self, policy: PasswordExpiration) -> Self {
        self.auth.expire = Some(policy);
        self
    }

    /// `None` when no clause was set; `ALTER USER` without clauses is a no-op.
    pub fn build(&self) -> Option<Statement> {
        if self.auth.is_empty() {
            return None;
        }
        let mut sql = format!("ALTER USER {}", self.account);
        let mut redacted = sql.clone();
        self.auth.render(&mut sql, &mut redacted);
        Some(Statement::new(sql, redacted))
    }
}

/// GRANT statement builder for privileges on one object
#[derive(Debug, Clone)]
pub struct GrantStatement<'a> {
    account: &'a AccountIdentity,
    scope: Scope,
    privileges: Vec<String>,
    with_grant_option: bool,
}

impl<'a> GrantStatement<'a> {
    pub fn new(account: &'a AccountIdentity, scope: Scope) -> Self {
        Self {
            account,
            scope,
            privileges: Vec::new(),
            with_grant_option: false,
        }
    }

    pub fn privilege(mut self, privilege: impl Into<String>) -> Self {
        self.privileges.push(privilege.into());
        self
    }

    pub fn with_grant_option(mut self) -> Self {
        self.with_grant_option = true;
        self
    }

    /// Granting only the grant option is written as `GRANT USAGE ... WITH GRANT OPTION`.
    pub fn build(&self) -> Statement {
        let privileges = if self.privileges.is_empty() {
            "USAGE".to_string()
        } else {
            self.privileges.join(", ")
        };
        let mut sql = format!("GRANT {privileges} ON {} TO {}", self.scope, self.account);
        if self.with_grant_option {
            sql.push_str(" WITH GRANT OPTION");
        }
        Statement::plain(sql)
    }
}

/// REVOKE statement builder for privileges on one object
#[derive(Debug, Clone)]
pub struct RevokeStatement<'a> {
    account: &'a AccountIdentity,
    scope: Scope,
    privileges: Vec<String>,
}

impl<'a> RevokeStatement<'a> {
    pub fn new(account: &'a AccountIdentity, scope: Scope) -> Self {
        Self {
            account,
            scope,
            privileges: Vec::new(),
        }
    }

    /// Add a privilege; `GRANT OPTION` is accepted like any other.
    pub fn privilege(mut self, privilege: impl Into<String>) -> Self {
        self.privileges.push(privilege.into());
        self
    }

    pub fn build(&self) -> Statement {
        Statement::plain(format!(
            "REVOKE {} ON {} FROM {}",
            self.privileges.join(", "),
            self.scope,
            self.account
        ))
    }
}

/// DROP USER statement builder
#[derive(Debug, Clone)]
pub struct DropUserStatement<'a> {
    account: &'a AccountIdentity,
    if_exists: bool,
}

impl<'a> DropUserStatement<'a> {
    pub fn new(account: &'a AccountIdentity) -> Self {
        Self {
            account,
            if_exists: false,
        }
    }

    pub fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }

    pub fn build(&self) -> Statement {
        let if_exists = if self.if_exists { "IF EXISTS " } else { "" };
        Statement::plain(format!("DROP USER {if_exists}{}", self.account))
    }
}
