//! In-process account catalog.
//!
//! `InMemoryCluster` plays the part of the write member of a cluster for the statements this
//! crate produces: `CREATE USER`, `ALTER USER`, `DROP USER`, `GRANT`, `REVOKE`, and the catalog
//! reads issued by the state resolver. It also accepts hand-written statements in the same
//! dialect, which makes it convenient for setting up drift in tests:
//!
//! ```
//! use accord::executor::{InMemoryCluster, StatementExecutor};
//!
//! let cluster = InMemoryCluster::new();
//! cluster.execute("CREATE USER 'svc'@'%' IDENTIFIED BY 'pw'", &[]).unwrap();
//! cluster.execute("GRANT SELECT ON app.* TO 'svc'@'%'", &[]).unwrap();
//! assert!(cluster.account_exists("svc", "%"));
//! ```
//!
//! Optional behaviors mimic server features the engine must cope with: a minimum password length
//! standing in for a password validation plugin, and one-shot injected failures.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use crate::executor::errors::{ER_CANNOT_USER, ER_CANT_CREATE_USER_WITH_GRANT, ER_NOT_VALID_PASSWORD};
use crate::executor::{ExecutorError, Row, StatementExecutor, Value};
use crate::options::{PasswordExpiration, Secret};
use crate::privileges::{GRANT_OPTION, Grant, Scope};

const ER_PARSE_ERROR: u16 = 1064;
const ER_NONEXISTING_GRANT: u16 = 1141;
const ER_NONEXISTING_TABLE_GRANT: u16 = 1147;

/// Message the server's password validation uses.
pub const PASSWORD_POLICY_MESSAGE: &str =
    "Your password does not satisfy the current policy requirements";

/// Stored state of one account.
#[derive(Debug, Clone, Default)]
pub struct StoredAccount {
    password: Option<Secret>,
    pub cert_issuer: String,
    pub cert_subject: String,
    pub password_lifetime: Option<u64>,
    pub grants: BTreeSet<Grant>,
}

impl StoredAccount {
    /// Whether the account has a non-empty password.
    pub fn has_password(&self) -> bool {
        self.password
            .as_ref()
            .is_some_and(|password| !password.expose().is_empty())
    }

    /// Whether `candidate` is the account's password.
    pub fn password_matches(&self, candidate: &str) -> bool {
        match &self.password {
            Some(password) => password.expose() == candidate,
            None => candidate.is_empty(),
        }
    }

    /// Stand-in for the `authentication_string` column: empty without a password, otherwise a
    /// digest that changes with the password.
    fn authentication_string(&self) -> String {
        match &self.password {
            Some(password) if !password.expose().is_empty() => {
                let digest = password
                    .expose()
                    .bytes()
                    .fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
                        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
                    });
                format!("*{digest:016X}")
            }
            _ => String::new(),
        }
    }
}

#[derive(Debug, Default)]
struct ClusterState {
    accounts: BTreeMap<(String, String), StoredAccount>,
    statements: Vec<String>,
    mutations: Vec<String>,
    failures: Vec<(String, ExecutorError)>,
    min_password_length: Option<usize>,
}

/// In-memory executor holding a catalog of accounts and their grants.
#[derive(Debug, Default)]
pub struct InMemoryCluster {
    state: Mutex<ClusterState>,
}

impl InMemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject passwords shorter than `min_length`, like a password validation plugin.
    pub fn with_password_policy(self, min_length: usize) -> Self {
        self.lock().min_password_length = Some(min_length);
        self
    }

    /// Fail the next statement whose text contains `fragment` with `error`.
    pub fn fail_on(&self, fragment: impl Into<String>, error: ExecutorError) {
        self.lock().failures.push((fragment.into(), error));
    }

    pub fn account_exists(&self, user: &str, host: &str) -> bool {
        self.lock()
            .accounts
            .contains_key(&(user.to_string(), host.to_string()))
    }

    /// A copy of an account's stored state.
    pub fn account(&self, user: &str, host: &str) -> Option<StoredAccount> {
        self.lock()
            .accounts
            .get(&(user.to_string(), host.to_string()))
            .cloned()
    }

    /// Every statement executed so far, reads included, in order.
    pub fn statements(&self) -> Vec<String> {
        self.lock().statements.clone()
    }

    /// Statements that changed the catalog, in order.
    pub fn mutations(&self) -> Vec<String> {
        self.lock().mutations.clone()
    }

    fn lock(&self) -> MutexGuard<'_, ClusterState> {
        // A panic while holding the lock cannot leave the catalog half-updated: every statement
        // is applied to a copy first.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StatementExecutor for InMemoryCluster {
    fn execute(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, ExecutorError> {
        let mut state = self.lock();
        state.statements.push(sql.to_string());

        if let Some(index) = state
            .failures
            .iter()
            .position(|(fragment, _)| sql.contains(fragment.as_str()))
        {
            let (_, error) = state.failures.remove(index);
            return Err(error);
        }

        let is_select = sql
            .trim_start()
            .get(..6)
            .is_some_and(|keyword| keyword.eq_ignore_ascii_case("SELECT"));
        if is_select {
            return select(&state, sql, params);
        }

        let tokens = tokenize(sql)?;
        let mut parser = Parser::new(&tokens);
        let mut accounts = state.accounts.clone();
        execute_write(&mut parser, &mut accounts, state.min_password_length)?;
        state.accounts = accounts;
        state.mutations.push(sql.to_string());
        Ok(Vec::new())
    }
}

fn parse_error(sql: &str) -> ExecutorError {
    ExecutorError::server(
        ER_PARSE_ERROR,
        format!("You have an error in your SQL syntax near '{sql}'"),
    )
}

fn cannot_user(operation: &str, account: &(String, String)) -> ExecutorError {
    ExecutorError::server(
        ER_CANNOT_USER,
        format!(
            "Operation {operation} failed for '{}'@'{}'",
            account.0, account.1
        ),
    )
}

fn grantee_of(account: &(String, String)) -> String {
    format!("'{}'@'{}'", account.0, account.1)
}

fn yes_no(flag: bool) -> Value {
    Value::from(if flag { "YES" } else { "NO" })
}

fn select(state: &ClusterState, sql: &str, params: &[Value]) -> Result<Vec<Row>, ExecutorError> {
    let text = |index: usize| params.get(index).and_then(Value::as_str).unwrap_or_default();

    if sql.contains("FROM mysql.user") {
        let key = (text(0).to_string(), text(1).to_string());
        return Ok(state
            .accounts
            .get(&key)
            .map(|account| {
                Row::new(vec![
                    Value::from(account.authentication_string()),
                    Value::from(account.cert_issuer.as_str()),
                    Value::from(account.cert_subject.as_str()),
                    Value::from(account.password_lifetime),
                ])
            })
            .into_iter()
            .collect());
    }

    let grantee = text(0);
    let Some(account) = state
        .accounts
        .iter()
        .find(|(key, _)| grantee_of(key) == grantee)
        .map(|(_, account)| account)
    else {
        return Ok(Vec::new());
    };
    let grantable = |scope: &Scope| account.grants.contains(&Grant::new(GRANT_OPTION, scope.clone()));
    let privileges_on = |scope: &Scope| {
        account
            .grants
            .iter()
            .filter(|grant| &grant.scope == scope && !grant.is_grant_option())
            .map(|grant| grant.privilege.clone())
            .collect::<Vec<_>>()
    };

    if sql.contains("USER_PRIVILEGES") {
        let mut privileges = privileges_on(&Scope::Global);
        if privileges.is_empty() {
            privileges.push("USAGE".to_string());
        }
        let is_grantable = grantable(&Scope::Global);
        return Ok(privileges
            .into_iter()
            .map(|privilege| Row::new(vec![Value::from(privilege), yes_no(is_grantable)]))
            .collect());
    }

    if sql.contains("SCHEMA_PRIVILEGES") {
        let schemas: BTreeSet<&str> = (1..params.len()).map(text).collect();
        let mut rows = Vec::new();
        for scope in account.grants.iter().map(|grant| &grant.scope).collect::<BTreeSet<_>>() {
            let Scope::Schema(schema) = scope else { continue };
            if !schemas.contains(schema.as_str()) {
                continue;
            }
            let is_grantable = grantable(scope);
            for privilege in privileges_on(scope) {
                rows.push(Row::new(vec![
                    Value::from(schema.as_str()),
                    Value::from(privilege),
                    yes_no(is_grantable),
                ]));
            }
        }
        return Ok(rows);
    }

    if sql.contains("TABLE_PRIVILEGES") {
        let tables: BTreeSet<(&str, &str)> = (1..params.len())
            .step_by(2)
            .map(|index| (text(index), text(index + 1)))
            .collect();
        let mut rows = Vec::new();
        for scope in account.grants.iter().map(|grant| &grant.scope).collect::<BTreeSet<_>>() {
            let Scope::Table { schema, table } = scope else { continue };
            if !tables.contains(&(schema.as_str(), table.as_str())) {
                continue;
            }
            let is_grantable = grantable(scope);
            for privilege in privileges_on(scope) {
                rows.push(Row::new(vec![
                    Value::from(schema.as_str()),
                    Value::from(table.as_str()),
                    Value::from(privilege),
                    yes_no(is_grantable),
                ]));
            }
        }
        return Ok(rows);
    }

    Err(parse_error(sql))
}

fn execute_write(
    parser: &mut Parser<'_>,
    accounts: &mut BTreeMap<(String, String), StoredAccount>,
    min_password_length: Option<usize>,
) -> Result<(), ExecutorError> {
    let check_password = |password: &Secret| match min_password_length {
        Some(min) if password.expose().chars().count() < min => Err(ExecutorError::server(
            ER_NOT_VALID_PASSWORD,
            PASSWORD_POLICY_MESSAGE,
        )),
        _ => Ok(()),
    };

    if parser.keyword("CREATE") {
        parser.expect_keyword("USER")?;
        let key = parser.account()?;
        let auth = parser.auth_clauses()?;
        parser.end()?;
        if accounts.contains_key(&key) {
            return Err(cannot_user("CREATE USER", &key));
        }
        let mut account = StoredAccount::default();
        if let Some(password) = &auth.password {
            check_password(password)?;
        }
        auth.apply(&mut account);
        accounts.insert(key, account);
        Ok(())
    } else if parser.keyword("ALTER") {
        parser.expect_keyword("USER")?;
        let key = parser.account()?;
        let auth = parser.auth_clauses()?;
        parser.end()?;
        let account = accounts
            .get_mut(&key)
            .ok_or_else(|| cannot_user("ALTER USER", &key))?;
        if let Some(password) = &auth.password {
            check_password(password)?;
        }
        auth.apply(account);
        Ok(())
    } else if parser.keyword("DROP") {
        parser.expect_keyword("USER")?;
        let if_exists = parser.keyword("IF");
        if if_exists {
            parser.expect_keyword("EXISTS")?;
        }
        let key = parser.account()?;
        parser.end()?;
        if accounts.remove(&key).is_none() && !if_exists {
            return Err(cannot_user("DROP USER", &key));
        }
        Ok(())
    } else if parser.keyword("GRANT") {
        let privileges = parser.privileges()?;
        let scope = parser.scope()?;
        parser.expect_keyword("TO")?;
        let key = parser.account()?;
        let with_grant_option = parser.keyword("WITH");
        if with_grant_option {
            parser.expect_keyword("GRANT")?;
            parser.expect_keyword("OPTION")?;
        }
        parser.end()?;
        let account = accounts.get_mut(&key).ok_or_else(|| {
            ExecutorError::server(
                ER_CANT_CREATE_USER_WITH_GRANT,
                "You are not allowed to create a user with GRANT",
            )
        })?;
        for privilege in privileges.into_iter().filter(|p| p != "USAGE") {
            account.grants.insert(Grant::new(privilege, scope.clone()));
        }
        if with_grant_option {
            account.grants.insert(Grant::new(GRANT_OPTION, scope));
        }
        Ok(())
    } else if parser.keyword("REVOKE") {
        let privileges = parser.privileges()?;
        let scope = parser.scope()?;
        parser.expect_keyword("FROM")?;
        let key = parser.account()?;
        parser.end()?;
        let no_such_grant = || {
            let code = if matches!(scope, Scope::Table { .. }) {
                ER_NONEXISTING_TABLE_GRANT
            } else {
                ER_NONEXISTING_GRANT
            };
            ExecutorError::server(
                code,
                format!(
                    "There is no such grant defined for user '{}' on host '{}'",
                    key.0, key.1
                ),
            )
        };
        let account = accounts.get_mut(&key).ok_or_else(no_such_grant)?;
        for privilege in privileges {
            if !account.grants.remove(&Grant::new(privilege, scope.clone())) {
                return Err(no_such_grant());
            }
        }
        Ok(())
    } else {
        Err(parser.error())
    }
}

/// Authentication clauses parsed from `CREATE USER` / `ALTER USER`.
#[derive(Debug, Default)]
struct AuthClauses {
    password: Option<Secret>,
    require: Option<(String, String)>,
    expire: Option<PasswordExpiration>,
}

impl AuthClauses {
    fn apply(self, account: &mut StoredAccount) {
        if let Some(password) = self.password {
            account.password = Some(password);
        }
        if let Some((issuer, subject)) = self.require {
            account.cert_issuer = issuer;
            account.cert_subject = subject;
        }
        if let Some(expire) = self.expire {
            account.password_lifetime = match expire {
                PasswordExpiration::Default => None,
                PasswordExpiration::Never => Some(0),
                PasswordExpiration::Days(days) => Some(u64::from(days)),
            };
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Str(String),
    Ident(String),
    Punct(char),
}

fn tokenize(sql: &str) -> Result<Vec<Token>, ExecutorError> {
    let mut tokens = Vec::new();
    let mut chars = sql.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '\'' | '"' => {
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        None => return Err(parse_error(sql)),
                        Some('\\') => match chars.next() {
                            Some('0') => text.push('\0'),
                            Some('n') => text.push('\n'),
                            Some('r') => text.push('\r'),
                            Some('Z') => text.push('\x1a'),
                            Some(escaped) => text.push(escaped),
                            None => return Err(parse_error(sql)),
                        },
                        Some(q) if q == c => {
                            if chars.peek() == Some(&c) {
                                chars.next();
                                text.push(c);
                            } else {
                                break;
                            }
                        }
                        Some(other) => text.push(other),
                    }
                }
                tokens.push(Token::Str(text));
            }
            '`' => {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        None => return Err(parse_error(sql)),
                        Some('`') if chars.peek() == Some(&'`') => {
                            chars.next();
                            name.push('`');
                        }
                        Some('`') => break,
                        Some(other) => name.push(other),
                    }
                }
                tokens.push(Token::Ident(name));
            }
            ',' | '.' | '@' | '*' | '(' | ')' | ';' => {
                chars.next();
                tokens.push(Token::Punct(c));
            }
            c if c.is_alphanumeric() || c == '_' || c == '%' || c == '$' => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' || c == '%' || c == '$' {
                        word.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Word(word));
            }
            _ => return Err(parse_error(sql)),
        }
    }
    if tokens.last() == Some(&Token::Punct(';')) {
        tokens.pop();
    }
    Ok(tokens)
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn error(&self) -> ExecutorError {
        let near = self
            .tokens
            .get(self.pos)
            .map(|token| format!("{token:?}"))
            .unwrap_or_default();
        ExecutorError::server(
            ER_PARSE_ERROR,
            format!("You have an error in your SQL syntax near {near}"),
        )
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Word(word)) if word.eq_ignore_ascii_case(keyword))
    }

    /// Consume `keyword` if it is next.
    fn keyword(&mut self, keyword: &str) -> bool {
        let found = self.peek_keyword(keyword);
        if found {
            self.pos += 1;
        }
        found
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), ExecutorError> {
        if self.keyword(keyword) {
            Ok(())
        } else {
            Err(self.error())
        }
    }

    fn punct(&mut self, c: char) -> bool {
        let found = self.peek() == Some(&Token::Punct(c));
        if found {
            self.pos += 1;
        }
        found
    }

    fn end(&self) -> Result<(), ExecutorError> {
        if self.pos == self.tokens.len() {
            Ok(())
        } else {
            Err(self.error())
        }
    }

    fn string(&mut self) -> Result<String, ExecutorError> {
        match self.peek() {
            Some(Token::Str(text)) => {
                self.pos += 1;
                Ok(text.clone())
            }
            _ => Err(self.error()),
        }
    }

    /// A name that may be a quoted string, a backquoted identifier, or a bare word.
    fn name(&mut self) -> Result<String, ExecutorError> {
        match self.peek() {
            Some(Token::Str(text) | Token::Ident(text) | Token::Word(text)) => {
                self.pos += 1;
                Ok(text.clone())
            }
            _ => Err(self.error()),
        }
    }

    fn account(&mut self) -> Result<(String, String), ExecutorError> {
        let user = self.name()?;
        let host = if self.punct('@') {
            self.name()?
        } else {
            "%".to_string()
        };
        Ok((user, host))
    }

    fn number(&mut self) -> Result<u32, ExecutorError> {
        match self.peek() {
            Some(Token::Word(word)) => {
                let n = word.parse().map_err(|_| self.error())?;
                self.pos += 1;
                Ok(n)
            }
            _ => Err(self.error()),
        }
    }

    /// Comma separated privilege names up to `ON`; multi-word names are joined by one space.
    fn privileges(&mut self) -> Result<Vec<String>, ExecutorError> {
        let mut privileges = Vec::new();
        let mut current: Vec<String> = Vec::new();
        loop {
            match self.peek() {
                Some(Token::Word(word)) if word.eq_ignore_ascii_case("ON") => {
                    self.pos += 1;
                    break;
                }
                Some(Token::Word(word)) => {
                    current.push(word.to_ascii_uppercase());
                    self.pos += 1;
                }
                Some(Token::Punct(',')) if !current.is_empty() => {
                    privileges.push(current.join(" "));
                    current.clear();
                    self.pos += 1;
                }
                _ => return Err(self.error()),
            }
        }
        if current.is_empty() {
            return Err(self.error());
        }
        privileges.push(current.join(" "));
        Ok(privileges)
    }

    fn scope(&mut self) -> Result<Scope, ExecutorError> {
        if self.punct('*') {
            if self.punct('.') && self.punct('*') {
                return Ok(Scope::Global);
            }
            return Err(self.error());
        }
        let schema = self.name()?;
        if !self.punct('.') {
            return Err(self.error());
        }
        if self.punct('*') {
            return Ok(Scope::Schema(schema));
        }
        let table = self.name()?;
        Ok(Scope::Table { schema, table })
    }

    fn auth_clauses(&mut self) -> Result<AuthClauses, ExecutorError> {
        let mut auth = AuthClauses::default();
        if self.keyword("IDENTIFIED") {
            self.expect_keyword("BY")?;
            auth.password = Some(Secret::new(self.string()?));
        }
        if self.keyword("REQUIRE") {
            let mut issuer = String::new();
            let mut subject = String::new();
            if !self.keyword("NONE") {
                loop {
                    if self.keyword("ISSUER") {
                        issuer = self.string()?;
                    } else if self.keyword("SUBJECT") {
                        subject = self.string()?;
                    } else {
                        return Err(self.error());
                    }
                    if !self.keyword("AND") {
                        break;
                    }
                }
            }
            auth.require = Some((issuer, subject));
        }
        if self.keyword("PASSWORD") {
            self.expect_keyword("EXPIRE")?;
            auth.expire = Some(if self.keyword("DEFAULT") {
                PasswordExpiration::Default
            } else if self.keyword("NEVER") {
                PasswordExpiration::Never
            } else if self.keyword("INTERVAL") {
                let days = self.number()?;
                self.expect_keyword("DAY")?;
                PasswordExpiration::Days(days)
            } else {
                return Err(self.error());
            });
        }
        Ok(auth)
    }
}
