//! Inventory loading and host pattern matching
//!
//! Understands INI and YAML inventory files, executable inventory scripts
//! that print JSON for `--list`, directories mixing any of these, and
//! inline comma-separated host lists.

use crate::error::{RelayError, Result};
use crate::utils::{fs::is_executable, process::ProcessRunner};
use glob::Pattern;
use regex::Regex;
use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::{debug, instrument};

/// Group every host belongs to implicitly
const ALL_GROUP: &str = "all";

/// Group for hosts declared before any section header
const UNGROUPED: &str = "ungrouped";

/// Inventory files in a directory that are skipped
const IGNORED_SUFFIXES: &[&str] = &["~", ".orig", ".bak", ".retry", ".pyc"];

/// Most hosts a single range expression may produce
const MAX_RANGE_HOSTS: usize = 10_000;

/// Key inventory scripts use for host variables rather than a group
const SCRIPT_META_KEY: &str = "_meta";

/// Section body kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Hosts,
    Children,
    Vars,
}

/// Hosts and groups known to the engine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    hosts: BTreeSet<String>,
    groups: BTreeMap<String, Group>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Group {
    hosts: BTreeSet<String>,
    children: BTreeSet<String>,
}

/// Inventory file parser
#[derive(Debug)]
pub struct InventoryParser {
    /// Regex for `[name]` and `[name:kind]` headers
    re_section: Regex,
    /// Regex for `prefix[start:end]suffix` host ranges
    re_range: Regex,
}

impl InventoryParser {
    /// Create a new inventory parser
    pub fn new() -> Result<Self> {
        Ok(Self {
            re_section: Regex::new(r"^\[\s*([^\]:\s]+)\s*(?::\s*([A-Za-z]+)\s*)?\]$")
                .map_err(|e| RelayError::inventory(format!("Failed to compile regex: {e}"), ""))?,
            re_range: Regex::new(r"^(.*?)\[([0-9]+|[a-z]):([0-9]+|[a-z])\](.*)$")
                .map_err(|e| RelayError::inventory(format!("Failed to compile regex: {e}"), ""))?,
        })
    }

    /// Parse file content into `inventory`, as YAML when it is a YAML
    /// group mapping and as INI otherwise
    pub fn parse_into(&self, content: &str, path: &Path, inventory: &mut Inventory) -> Result<()> {
        match serde_yaml::from_str::<YamlValue>(content) {
            Ok(YamlValue::Mapping(groups)) if is_group_mapping(&groups) => {
                debug!("Parsing {} as YAML inventory", path.display());
                for (name, body) in &groups {
                    let name = yaml_key(name, path)?;
                    self.parse_yaml_group(&name, body, path, inventory)?;
                }
                Ok(())
            }
            _ => self.parse_ini(content, path, inventory),
        }
    }

    fn parse_ini(&self, content: &str, path: &Path, inventory: &mut Inventory) -> Result<()> {
        let mut group = UNGROUPED.to_string();
        let mut section = Section::Hosts;

        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if line.starts_with('[') {
                let cap = self.re_section.captures(line).ok_or_else(|| {
                    RelayError::inventory(
                        format!("line {}: malformed section header '{line}'", index + 1),
                        path,
                    )
                })?;
                group = cap.get(1).map_or("", |m| m.as_str()).to_string();
                section = match cap.get(2).map(|m| m.as_str()) {
                    None => Section::Hosts,
                    Some("children") => Section::Children,
                    Some("vars") => Section::Vars,
                    Some(other) => {
                        return Err(RelayError::inventory(
                            format!("line {}: unknown section kind '{other}'", index + 1),
                            path,
                        ));
                    }
                };
                inventory.groups.entry(group.clone()).or_default();
                debug!("inventory section {} ({:?})", group, section);
                continue;
            }

            let Some(name) = line.split_whitespace().next() else {
                continue;
            };

            match section {
                Section::Vars => {}
                Section::Children => inventory.add_child(&group, name),
                Section::Hosts => {
                    for host in self.expand_range(strip_port(name), path)? {
                        inventory.add_host(&group, &host);
                    }
                }
            }
        }

        Ok(())
    }

    /// One YAML group body: `hosts` and `children` mappings, `vars` ignored
    fn parse_yaml_group(&self, name: &str, body: &YamlValue, path: &Path, inventory: &mut Inventory) -> Result<()> {
        let group = if name == ALL_GROUP { UNGROUPED } else { name };
        inventory.groups.entry(group.to_string()).or_default();

        match body.get("hosts") {
            None | Some(YamlValue::Null) => {}
            Some(YamlValue::Mapping(hosts)) => {
                for key in hosts.keys() {
                    let key = yaml_key(key, path)?;
                    for host in self.expand_range(strip_port(&key), path)? {
                        inventory.add_host(group, &host);
                    }
                }
            }
            Some(_) => {
                return Err(RelayError::inventory(
                    format!("hosts of group '{name}' must be a mapping"),
                    path,
                ));
            }
        }

        match body.get("children") {
            None | Some(YamlValue::Null) => {}
            Some(YamlValue::Mapping(children)) => {
                for (child, child_body) in children {
                    let child = yaml_key(child, path)?;
                    if name != ALL_GROUP {
                        inventory.add_child(name, &child);
                    }
                    self.parse_yaml_group(&child, child_body, path, inventory)?;
                }
            }
            Some(_) => {
                return Err(RelayError::inventory(
                    format!("children of group '{name}' must be a mapping"),
                    path,
                ));
            }
        }

        Ok(())
    }

    /// Expand `web[01:03]` style ranges; names without a range pass through
    fn expand_range(&self, name: &str, path: &Path) -> Result<Vec<String>> {
        let Some(cap) = self.re_range.captures(name) else {
            return Ok(vec![name.to_string()]);
        };
        let part = |i| cap.get(i).map_or("", |m| m.as_str());
        let (prefix, start, end, suffix) = (part(1), part(2), part(3), part(4));
        let invalid = |reason: &str| RelayError::inventory(format!("host range '{name}' {reason}"), path);

        let expanded: Vec<String> = match (start.parse::<u64>(), end.parse::<u64>()) {
            (Ok(first), Ok(last)) => {
                if first > last {
                    return Err(invalid("is reversed"));
                }
                if last - first >= MAX_RANGE_HOSTS as u64 {
                    return Err(invalid(&format!("expands to more than {MAX_RANGE_HOSTS} hosts")));
                }
                let width = if start.starts_with('0') { start.len() } else { 0 };
                (first..=last)
                    .map(|n| format!("{prefix}{n:0width$}{suffix}"))
                    .collect()
            }
            _ => match (start.chars().next(), end.chars().next()) {
                (Some(first), Some(last)) if first.is_ascii_lowercase() && last.is_ascii_lowercase() => {
                    if first > last {
                        return Err(invalid("is reversed"));
                    }
                    (first..=last).map(|c| format!("{prefix}{c}{suffix}")).collect()
                }
                _ => return Err(invalid("mixes numbers and letters")),
            },
        };

        // Further ranges later in the name
        let mut hosts = Vec::with_capacity(expanded.len());
        for host in expanded {
            if self.re_range.is_match(&host) {
                hosts.extend(self.expand_range(&host, path)?);
            } else {
                hosts.push(host);
            }
            if hosts.len() > MAX_RANGE_HOSTS {
                return Err(invalid(&format!("expands to more than {MAX_RANGE_HOSTS} hosts")));
            }
        }
        Ok(hosts)
    }
}

/// Whether a YAML document looks like `group: {hosts, children, vars}`
fn is_group_mapping(groups: &serde_yaml::Mapping) -> bool {
    !groups.is_empty()
        && groups
            .values()
            .all(|body| matches!(body, YamlValue::Mapping(_) | YamlValue::Null))
}

fn yaml_key(key: &YamlValue, path: &Path) -> Result<String> {
    match key {
        YamlValue::String(name) => Ok(name.clone()),
        YamlValue::Number(number) => Ok(number.to_string()),
        other => Err(RelayError::inventory(
            format!("unsupported inventory name {other:?}"),
            path,
        )),
    }
}

/// Drop a trailing `:port` from a host token
///
/// Bare IPv6 addresses keep their colons; a bracketed range such as
/// `web[1:3]` is not a port.
fn strip_port(token: &str) -> &str {
    let Some((host, port)) = token.rsplit_once(':') else {
        return token;
    };
    let colon_outside_brackets = host.split(['[', ']']).step_by(2).any(|part| part.contains(':'));
    if host.is_empty() || port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) || colon_outside_brackets {
        return token;
    }
    host
}

impl Inventory {
    /// Load an inventory source
    ///
    /// A directory has every inventory file in it merged; a path that does
    /// not exist but contains a comma is an inline host list.
    #[instrument]
    pub fn load(path: &Path) -> Result<Self> {
        let parser = InventoryParser::new()?;
        let mut inventory = Self::default();

        if path.is_dir() {
            let mut files: Vec<_> = fs::read_dir(path)
                .map_err(|e| RelayError::inventory(e.to_string(), path))?
                .filter_map(|entry| entry.ok().map(|entry| entry.path()))
                .filter(|file| file.is_file() && is_inventory_file(file))
                .collect();
            files.sort();
            for file in files {
                debug!("Loading inventory file: {}", file.display());
                inventory.load_file(&parser, &file)?;
            }
        } else if path.is_file() {
            inventory.load_file(&parser, path)?;
        } else if path.to_string_lossy().contains(',') {
            inventory = Self::from_host_list(&path.to_string_lossy());
        } else {
            return Err(RelayError::inventory("no such file or directory", path));
        }

        debug!(
            "Inventory has {} hosts in {} groups",
            inventory.hosts.len(),
            inventory.groups.len()
        );
        Ok(inventory)
    }

    fn load_file(&mut self, parser: &InventoryParser, path: &Path) -> Result<()> {
        if is_executable(path) {
            return self.load_script(path);
        }
        let content = fs::read_to_string(path).map_err(|e| RelayError::inventory(e.to_string(), path))?;
        parser.parse_into(&content, path, self)
    }

    /// Run an inventory script with `--list` and merge its JSON groups
    fn load_script(&mut self, path: &Path) -> Result<()> {
        debug!("Running inventory script: {}", path.display());
        let program = path.display().to_string();
        let output = ProcessRunner::default()
            .run_command_with_output(&program, &["--list"])
            .map_err(|e| RelayError::inventory(format!("inventory script failed: {e}"), path))?;
        let groups: serde_json::Map<String, JsonValue> = serde_json::from_str(&output.stdout)
            .map_err(|e| RelayError::inventory(format!("inventory script printed invalid JSON: {e}"), path))?;

        let names = |value: Option<&JsonValue>| -> Vec<String> {
            value
                .and_then(JsonValue::as_array)
                .map(|items| items.iter().filter_map(JsonValue::as_str).map(str::to_string).collect())
                .unwrap_or_default()
        };

        for (name, body) in groups.iter().filter(|(name, _)| *name != SCRIPT_META_KEY) {
            let group = if name == ALL_GROUP { UNGROUPED } else { name.as_str() };
            self.groups.entry(group.to_string()).or_default();
            let (hosts, children) = match body {
                JsonValue::Array(_) => (names(Some(body)), Vec::new()),
                JsonValue::Object(fields) => (names(fields.get("hosts")), names(fields.get("children"))),
                _ => {
                    return Err(RelayError::inventory(
                        format!("group '{name}' must be a list or an object"),
                        path,
                    ));
                }
            };
            for host in hosts {
                self.add_host(group, &host);
            }
            if name != ALL_GROUP {
                for child in children {
                    self.add_child(name, &child);
                }
            }
        }
        Ok(())
    }

    /// Parse INI or YAML inventory content
    pub fn parse(content: &str) -> Result<Self> {
        let mut inventory = Self::default();
        InventoryParser::new()?.parse_into(content, Path::new("<inline>"), &mut inventory)?;
        Ok(inventory)
    }

    /// Inventory from `"host1,host2,"`
    pub fn from_host_list(list: &str) -> Self {
        let mut inventory = Self::default();
        for host in list.split(',').map(str::trim).filter(|host| !host.is_empty()) {
            inventory.add_host(UNGROUPED, host);
        }
        inventory
    }

    fn add_child(&mut self, group: &str, child: &str) {
        self.groups.entry(child.to_string()).or_default();
        self.groups
            .entry(group.to_string())
            .or_default()
            .children
            .insert(child.to_string());
    }

    fn add_host(&mut self, group: &str, host: &str) {
        self.hosts.insert(host.to_string());
        self.groups
            .entry(group.to_string())
            .or_default()
            .hosts
            .insert(host.to_string());
    }

    /// Every known host name, sorted
    pub fn hosts(&self) -> Vec<String> {
        self.hosts.iter().cloned().collect()
    }

    /// Hosts selected by `patterns`, sorted and deduplicated
    ///
    /// Each pattern splits on `:` and `,`. Plain terms are unioned, then
    /// `&` terms intersect and `!` terms exclude.
    pub fn list_hosts<S: AsRef<str>>(&self, patterns: &[S]) -> Vec<String> {
        let mut include = Vec::new();
        let mut intersect = Vec::new();
        let mut exclude = Vec::new();

        for term in patterns
            .iter()
            .flat_map(|pattern| pattern.as_ref().split([':', ',']))
            .map(str::trim)
            .filter(|term| !term.is_empty())
        {
            if let Some(rest) = term.strip_prefix('!') {
                exclude.push(rest);
            } else if let Some(rest) = term.strip_prefix('&') {
                intersect.push(rest);
            } else {
                include.push(term);
            }
        }

        let mut selected: BTreeSet<String> = include
            .iter()
            .flat_map(|term| self.match_term(term))
            .collect();
        for term in intersect {
            let matched = self.match_term(term);
            selected.retain(|host| matched.contains(host));
        }
        for term in exclude {
            let matched = self.match_term(term);
            selected.retain(|host| !matched.contains(host));
        }

        selected.into_iter().collect()
    }

    /// Hosts matched by one pattern term
    fn match_term(&self, term: &str) -> BTreeSet<String> {
        if term == ALL_GROUP || term == "*" {
            return self.hosts.clone();
        }

        if let Some(expr) = term.strip_prefix('~') {
            return match Regex::new(expr) {
                Ok(re) => self.match_names(|name| re.is_match(name)),
                Err(e) => {
                    debug!("ignoring invalid host regex '{}': {}", expr, e);
                    BTreeSet::new()
                }
            };
        }

        if term.contains(['*', '?', '[']) {
            return match Pattern::new(term) {
                Ok(glob) => self.match_names(|name| glob.matches(name)),
                Err(e) => {
                    debug!("ignoring invalid host glob '{}': {}", term, e);
                    BTreeSet::new()
                }
            };
        }

        self.match_names(|name| name == term)
    }

    /// Hosts whose name, or whose group's name, satisfies `matches`
    fn match_names(&self, matches: impl Fn(&str) -> bool) -> BTreeSet<String> {
        let mut found: BTreeSet<String> = self
            .hosts
            .iter()
            .filter(|host| matches(host))
            .cloned()
            .collect();
        for name in self.groups.keys().filter(|name| matches(name)) {
            found.extend(self.group_hosts(name));
        }
        found
    }

    /// Hosts of a group including those of its descendants
    fn group_hosts(&self, name: &str) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        let mut visited = BTreeSet::new();
        let mut pending = vec![name.to_string()];

        while let Some(current) = pending.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            if let Some(group) = self.groups.get(&current) {
                found.extend(group.hosts.iter().cloned());
                pending.extend(group.children.iter().cloned());
            }
        }
        found
    }
}

fn is_inventory_file(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    !name.starts_with('.') && !IGNORED_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r"
# hosts file
bastion.example.com

[web]
web[01:03].example.com ansible_port=2222
; legacy comment
static.example.com

[db]
db-[a:b].example.com

[prod:children]
web
db

[prod:vars]
env=production
";

    fn sample() -> Inventory {
        Inventory::parse(SAMPLE).unwrap()
    }

    #[test]
    fn test_parse_groups_and_ranges() {
        let inventory = sample();
        assert_eq!(
            inventory.hosts(),
            vec![
                "bastion.example.com",
                "db-a.example.com",
                "db-b.example.com",
                "static.example.com",
                "web01.example.com",
                "web02.example.com",
                "web03.example.com",
            ]
        );
        assert!(!inventory.hosts().iter().any(|host| host.starts_with("env")));
    }

    #[test]
    fn test_all_matches_every_host() {
        let inventory = sample();
        assert_eq!(inventory.list_hosts(&["all"]).len(), 7);
        assert_eq!(inventory.list_hosts(&["*"]).len(), 7);
    }

    #[test]
    fn test_group_and_children() {
        let inventory = sample();
        assert_eq!(inventory.list_hosts(&["db"]), vec!["db-a.example.com", "db-b.example.com"]);
        assert_eq!(inventory.list_hosts(&["prod"]).len(), 6);
        assert_eq!(inventory.list_hosts(&["ungrouped"]), vec!["bastion.example.com"]);
    }

    #[test]
    fn test_union_intersection_exclusion() {
        let inventory = sample();
        assert_eq!(inventory.list_hosts(&["web:db"]).len(), 6);
        assert_eq!(
            inventory.list_hosts(&["prod:&db"]),
            vec!["db-a.example.com", "db-b.example.com"]
        );
        assert_eq!(
            inventory.list_hosts(&["prod:!web"]),
            vec!["db-a.example.com", "db-b.example.com"]
        );
        assert_eq!(inventory.list_hosts(&["web", "db"]).len(), 6);
    }

    #[test]
    fn test_glob_and_regex_terms() {
        let inventory = sample();
        assert_eq!(inventory.list_hosts(&["web0*"]).len(), 3);
        assert_eq!(inventory.list_hosts(&["~^db-[ab]"]).len(), 2);
        assert!(inventory.list_hosts(&["~("]).is_empty());
    }

    #[test]
    fn test_unknown_pattern_matches_nothing() {
        let inventory = Inventory::from_host_list("a,b,");
        assert_eq!(inventory.hosts(), vec!["a", "b"]);
        assert!(inventory.list_hosts(&["c"]).is_empty());
    }

    #[test]
    fn test_child_cycles_terminate() {
        let inventory = Inventory::parse("[a:children]\nb\n[b:children]\na\n[b]\nhost1\n").unwrap();
        assert_eq!(inventory.list_hosts(&["a"]), vec!["host1"]);
    }

    #[test]
    fn test_malformed_header_is_an_error() {
        let result = Inventory::parse("[web\nhost1\n");
        assert!(matches!(result, Err(RelayError::Inventory { .. })));
        let result = Inventory::parse("[web:weird]\nhost1\n");
        assert!(matches!(result, Err(RelayError::Inventory { .. })));
    }

    #[test]
    fn test_load_file_directory_and_host_list() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("inventory");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("web"), "[web]\nweb1\n").unwrap();
        fs::write(dir.join("db.ini"), "[db]\ndb1\n").unwrap();
        fs::write(dir.join("db.ini.bak"), "[db]\nstale\n").unwrap();
        fs::write(dir.join(".hidden"), "ghost\n").unwrap();

        let inventory = Inventory::load(&dir).unwrap();
        assert_eq!(inventory.hosts(), vec!["db1", "web1"]);

        let single = Inventory::load(&dir.join("web")).unwrap();
        assert_eq!(single.hosts(), vec!["web1"]);

        let inline = Inventory::load(Path::new("alpha,beta")).unwrap();
        assert_eq!(inline.list_hosts(&["beta"]), vec!["beta"]);

        let missing = Inventory::load(&temp_dir.path().join("missing"));
        assert!(matches!(missing, Err(RelayError::Inventory { .. })));
    }

    #[test]
    fn test_host_ports_are_not_part_of_the_name() {
        let inventory = Inventory::parse("[web]\nweb1.example.com:2222\nweb[2:3].example.com:22 ansible_user=ops\nfe80::1\n").unwrap();
        assert_eq!(
            inventory.hosts(),
            vec!["fe80::1", "web1.example.com", "web2.example.com", "web3.example.com"]
        );
        assert_eq!(inventory.list_hosts(&["web1.example.com"]), vec!["web1.example.com"]);
    }

    #[test]
    fn test_yaml_inventory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("hosts.yml");
        fs::write(
            &path,
            "all:\n  hosts:\n    a:\n    b:\n  children:\n    web:\n      hosts:\n        web[1:2]:\n          http_port: 80\n        proxy:8080:\n      vars:\n        tier: front\n    prod:\n      children:\n        web:\n",
        )
        .unwrap();

        let inventory = Inventory::load(&path).unwrap();
        assert_eq!(inventory.hosts(), vec!["a", "b", "proxy", "web1", "web2"]);
        assert_eq!(inventory.list_hosts(&["a"]), vec!["a"]);
        assert_eq!(inventory.list_hosts(&["prod"]), vec!["proxy", "web1", "web2"]);
        assert_eq!(inventory.list_hosts(&["ungrouped"]), vec!["a", "b"]);
        assert!(inventory.list_hosts(&["hosts"]).is_empty());
    }

    #[test]
    fn test_yaml_with_bad_hosts_is_an_error() {
        let result = Inventory::parse("web:\n  hosts:\n    - a\n    - b\n");
        assert!(matches!(result, Err(RelayError::Inventory { .. })));
    }

    #[cfg(unix)]
    fn write_script(path: &Path, body: &str) {
        use std::os::unix::fs::PermissionsExt;

        fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_executable_inventory_script() {
        let temp_dir = TempDir::new().unwrap();
        let script = temp_dir.path().join("inventory.sh");
        write_script(
            &script,
            r#"[ "$1" = "--list" ] || exit 1
echo '{"web": {"hosts": ["a"], "vars": {}}, "db": ["b"], "prod": {"children": ["web", "db"]}, "_meta": {"hostvars": {"ghost": {}}}}'"#,
        );

        let inventory = Inventory::load(&script).unwrap();
        assert_eq!(inventory.hosts(), vec!["a", "b"]);
        assert_eq!(inventory.list_hosts(&["web"]), vec!["a"]);
        assert_eq!(inventory.list_hosts(&["prod"]), vec!["a", "b"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_or_garbled_script_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let failing = temp_dir.path().join("failing");
        write_script(&failing, "exit 2");
        assert!(matches!(Inventory::load(&failing), Err(RelayError::Inventory { .. })));

        let garbled = temp_dir.path().join("garbled");
        write_script(&garbled, "echo 'not json'");
        assert!(matches!(Inventory::load(&garbled), Err(RelayError::Inventory { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_directory_mixes_formats() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("01-static"), "[web]\nweb1:2222\n").unwrap();
        fs::write(temp_dir.path().join("02-cloud.yml"), "db:\n  hosts:\n    db1:\n").unwrap();
        write_script(&temp_dir.path().join("03-dynamic"), r#"echo '{"cache": ["redis1"]}'"#);

        let inventory = Inventory::load(temp_dir.path()).unwrap();
        assert_eq!(inventory.hosts(), vec!["db1", "redis1", "web1"]);
        assert_eq!(inventory.list_hosts(&["db:cache"]), vec!["db1", "redis1"]);
    }

    #[test]
    fn test_reversed_range_is_an_error() {
        for content in ["web[5:1]\n", "db-[c:a]\n", "mixed[1:b]\n"] {
            let result = Inventory::parse(content);
            assert!(matches!(result, Err(RelayError::Inventory { .. })), "{content}");
        }
    }

    #[test]
    fn test_oversized_range_is_an_error() {
        let result = Inventory::parse("web[0:99999999999]\n");
        assert!(matches!(result, Err(RelayError::Inventory { .. })));

        // Each range is small but together they multiply past the limit
        let result = Inventory::parse("rack[1:200]-node[1:200]\n");
        assert!(matches!(result, Err(RelayError::Inventory { .. })));

        let inventory = Inventory::parse("rack[1:2]-node[01:03]\n").unwrap();
        assert_eq!(inventory.hosts().len(), 6);
        assert!(inventory.hosts().contains(&"rack2-node03".to_string()));
    }
}
