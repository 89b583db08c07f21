//! Cluster-wide statements: session settings, database, resource management,
//! roles and tablespaces.

use crate::catalog::{
    CatalogObjectRecord, ResourceGroupDefinition, ResourceQueueDefinition, RoleDefinition,
    RoleMembership, SessionSettings,
};
use crate::error::{Error, Result};

/// Resource groups the cluster creates itself; only their settings are restored.
const BUILTIN_RESOURCE_GROUPS: [&str; 2] = ["default_group", "admin_group"];

/// Session setting only sources before version 5 need; it gets its own entry
/// so a restore into a newer cluster can skip it.
pub(super) const LEGACY_SESSION_GUCS: &str = "SET gp_strict_xml_parse = off;\n";

pub(super) fn session_gucs(settings: &SessionSettings) -> String {
    format!(
        "SET statement_timeout = 0;\n\
         SET check_function_bodies = false;\n\
         SET client_min_messages = error;\n\
         SET client_encoding = '{}';\n\
         SET standard_conforming_strings = on;\n\
         SET default_with_oids = {};\n",
        settings.client_encoding, settings.default_with_oids
    )
}

pub(super) fn create_database(name: &str, tablespace: &str) -> String {
    if tablespace.is_empty() || tablespace == "pg_default" {
        format!("\n\nCREATE DATABASE {name};")
    } else {
        format!("\n\nCREATE DATABASE {name} TABLESPACE {tablespace};")
    }
}

pub(super) fn database_gucs(name: &str, settings: &[String]) -> String {
    settings
        .iter()
        .map(|guc| format!("\nALTER DATABASE {name} {guc};"))
        .collect()
}

pub(super) fn resource_queue(
    record: &CatalogObjectRecord,
    queue: &ResourceQueueDefinition,
) -> Result<String> {
    let parse_cost = |field: &str, value: &str| -> Result<f64> {
        value.trim().parse::<f64>().map_err(|e| Error::Render {
            schema: record.schema.clone(),
            name: record.name.clone(),
            reason: format!("{field} {value:?} is not a number: {e}"),
        })
    };

    let mut attributes = Vec::new();
    if queue.active_statements != -1 {
        attributes.push(format!("ACTIVE_STATEMENTS={}", queue.active_statements));
    }
    if parse_cost("max_cost", &queue.max_cost)? > -1.0 {
        attributes.push(format!("MAX_COST={}", queue.max_cost));
    }
    if queue.cost_overcommit {
        attributes.push("COST_OVERCOMMIT=TRUE".to_string());
    }
    if parse_cost("min_cost", &queue.min_cost)? > 0.0 {
        attributes.push(format!("MIN_COST={}", queue.min_cost));
    }
    if queue.priority != "medium" {
        attributes.push(format!("PRIORITY={}", queue.priority.to_uppercase()));
    }
    if queue.memory_limit != "-1" {
        attributes.push(format!("MEMORY_LIMIT='{}'", queue.memory_limit));
    }

    let action = if record.name == "pg_default" {
        "ALTER"
    } else {
        "CREATE"
    };
    Ok(format!(
        "\n\n{action} RESOURCE QUEUE {} WITH ({});",
        record.name,
        attributes.join(", ")
    ))
}

pub(super) fn resource_group(name: &str, group: &ResourceGroupDefinition) -> String {
    let settings = [
        ("CPU_RATE_LIMIT", group.cpu_rate_limit),
        ("MEMORY_LIMIT", group.memory_limit),
        ("MEMORY_SHARED_QUOTA", group.memory_shared_quota),
        ("MEMORY_SPILL_RATIO", group.memory_spill_ratio),
        ("CONCURRENCY", group.concurrency),
    ];

    if BUILTIN_RESOURCE_GROUPS.contains(&name) {
        return settings
            .iter()
            .map(|(setting, value)| format!("\n\nALTER RESOURCE GROUP {name} SET {setting} {value};"))
            .collect();
    }

    let attributes: Vec<String> = settings
        .iter()
        .map(|(setting, value)| format!("{setting}={value}"))
        .collect();
    format!(
        "\n\nCREATE RESOURCE GROUP {name} WITH ({});",
        attributes.join(", ")
    )
}

fn flag(enabled: bool, on: &str, off: &str) -> String {
    let word = if enabled { on } else { off };
    word.to_string()
}

pub(super) fn create_role(name: &str, role: &RoleDefinition, with_resource_group: bool) -> String {
    let mut attrs = vec![
        flag(role.superuser, "SUPERUSER", "NOSUPERUSER"),
        flag(role.inherit, "INHERIT", "NOINHERIT"),
        flag(role.create_role, "CREATEROLE", "NOCREATEROLE"),
        flag(role.create_db, "CREATEDB", "NOCREATEDB"),
        flag(role.can_login, "LOGIN", "NOLOGIN"),
    ];
    if role.connection_limit != -1 {
        attrs.push(format!("CONNECTION LIMIT {}", role.connection_limit));
    }
    if !role.password.is_empty() {
        attrs.push(format!("PASSWORD '{}'", role.password));
    }
    if !role.valid_until.is_empty() {
        attrs.push(format!("VALID UNTIL '{}'", role.valid_until));
    }
    attrs.push(format!("RESOURCE QUEUE {}", role.resource_queue));
    if with_resource_group {
        attrs.push(format!("RESOURCE GROUP {}", role.resource_group));
    }

    let external_table_grants = [
        (role.create_readable_http, "protocol='http'"),
        (role.create_readable_gpfdist, "protocol='gpfdist', type='readable'"),
        (role.create_writable_gpfdist, "protocol='gpfdist', type='writable'"),
        (role.create_readable_hdfs, "protocol='gphdfs', type='readable'"),
        (role.create_writable_hdfs, "protocol='gphdfs', type='writable'"),
    ];
    for (granted, options) in external_table_grants {
        if granted {
            attrs.push(format!("CREATEEXTTABLE ({options})"));
        }
    }

    let mut text = format!(
        "\n\nCREATE ROLE {name};\nALTER ROLE {name} WITH {};",
        attrs.join(" ")
    );
    for window in &role.time_constraints {
        text.push_str(&format!(
            "\nALTER ROLE {name} DENY BETWEEN DAY {} TIME '{}' AND DAY {} TIME '{}';",
            window.start_day, window.start_time, window.end_day, window.end_time
        ));
    }
    text
}

/// Grant lines of one member, set off from the preceding role block by a
/// blank line.
pub(super) fn role_grants(member: &str, memberships: &[RoleMembership]) -> String {
    if memberships.is_empty() {
        return String::new();
    }
    let mut text = String::from("\n");
    for m in memberships {
        let admin = if m.admin_option { " WITH ADMIN OPTION" } else { "" };
        text.push_str(&format!(
            "\nGRANT {} TO {member}{admin} GRANTED BY {};",
            m.role, m.grantor
        ));
    }
    text
}

pub(super) fn create_tablespace(name: &str, filespace: &str) -> String {
    format!("\n\nCREATE TABLESPACE {name} FILESPACE {filespace};")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ObjectDetails, TimeConstraint};

    fn queue(name: &str, def: ResourceQueueDefinition) -> (CatalogObjectRecord, ResourceQueueDefinition) {
        let record = CatalogObjectRecord::new(1, "", name, ObjectDetails::ResourceQueue(def.clone()));
        (record, def)
    }

    #[test]
    fn test_session_gucs_block() {
        let settings = SessionSettings {
            client_encoding: "UTF8".to_string(),
            default_with_oids: false,
        };
        let text = session_gucs(&settings);
        assert!(text.starts_with("SET statement_timeout = 0;\n"));
        assert!(text.contains("SET client_encoding = 'UTF8';\n"));
        assert!(text.ends_with("SET default_with_oids = false;\n"));
        assert!(!text.contains("gp_strict_xml_parse"));
    }

    #[test]
    fn test_create_database_tablespace() {
        assert_eq!(create_database("db", "pg_default"), "\n\nCREATE DATABASE db;");
        assert_eq!(
            create_database("db", "fast"),
            "\n\nCREATE DATABASE db TABLESPACE fast;"
        );
    }

    #[test]
    fn test_database_gucs_one_line_each() {
        let gucs = vec![
            "SET search_path TO public".to_string(),
            "SET work_mem TO '64MB'".to_string(),
        ];
        assert_eq!(
            database_gucs("db", &gucs),
            "\nALTER DATABASE db SET search_path TO public;\nALTER DATABASE db SET work_mem TO '64MB';"
        );
        assert_eq!(database_gucs("db", &[]), "");
    }

    #[test]
    fn test_resource_queue_lists_only_non_defaults() {
        let (record, def) = queue("pg_default", ResourceQueueDefinition::default());
        assert_eq!(
            resource_queue(&record, &def).unwrap(),
            "\n\nALTER RESOURCE QUEUE pg_default WITH ();"
        );

        let (record, def) = queue(
            "etl",
            ResourceQueueDefinition {
                active_statements: 5,
                max_cost: "32.80".to_string(),
                cost_overcommit: true,
                min_cost: "1.5".to_string(),
                priority: "high".to_string(),
                memory_limit: "1GB".to_string(),
            },
        );
        assert_eq!(
            resource_queue(&record, &def).unwrap(),
            "\n\nCREATE RESOURCE QUEUE etl WITH (ACTIVE_STATEMENTS=5, MAX_COST=32.80, \
             COST_OVERCOMMIT=TRUE, MIN_COST=1.5, PRIORITY=HIGH, MEMORY_LIMIT='1GB');"
        );
    }

    #[test]
    fn test_resource_queue_rejects_malformed_cost() {
        let (record, def) = queue(
            "etl",
            ResourceQueueDefinition {
                max_cost: "lots".to_string(),
                ..Default::default()
            },
        );
        assert!(matches!(
            resource_queue(&record, &def),
            Err(Error::Render { .. })
        ));
    }

    #[test]
    fn test_builtin_resource_group_is_altered() {
        let group = ResourceGroupDefinition {
            cpu_rate_limit: 10,
            memory_limit: 30,
            memory_shared_quota: 50,
            memory_spill_ratio: 20,
            concurrency: 20,
        };
        let text = resource_group("admin_group", &group);
        assert_eq!(text.matches("ALTER RESOURCE GROUP admin_group SET").count(), 5);
        assert!(text.ends_with("SET CONCURRENCY 20;"));

        assert_eq!(
            resource_group("reporting", &group),
            "\n\nCREATE RESOURCE GROUP reporting WITH (CPU_RATE_LIMIT=10, MEMORY_LIMIT=30, \
             MEMORY_SHARED_QUOTA=50, MEMORY_SPILL_RATIO=20, CONCURRENCY=20);"
        );
    }

    #[test]
    fn test_create_role_attributes() {
        let role = RoleDefinition {
            superuser: true,
            can_login: true,
            connection_limit: 4,
            password: "md5abc".to_string(),
            resource_group: "default_group".to_string(),
            create_readable_gpfdist: true,
            time_constraints: vec![TimeConstraint {
                start_day: 0,
                start_time: "13:30:00".to_string(),
                end_day: 3,
                end_time: "14:30:00".to_string(),
            }],
            ..Default::default()
        };

        let text = create_role("\"Bob\"", &role, true);
        assert_eq!(
            text,
            "\n\nCREATE ROLE \"Bob\";\nALTER ROLE \"Bob\" WITH SUPERUSER INHERIT NOCREATEROLE \
             NOCREATEDB LOGIN CONNECTION LIMIT 4 PASSWORD 'md5abc' RESOURCE QUEUE pg_default \
             RESOURCE GROUP default_group CREATEEXTTABLE (protocol='gpfdist', type='readable');\
             \nALTER ROLE \"Bob\" DENY BETWEEN DAY 0 TIME '13:30:00' AND DAY 3 TIME '14:30:00';"
        );
        assert!(!create_role("r", &role, false).contains("RESOURCE GROUP"));
    }

    #[test]
    fn test_role_grants() {
        let memberships = vec![
            RoleMembership {
                role: "admins".to_string(),
                grantor: "gpadmin".to_string(),
                admin_option: true,
            },
            RoleMembership {
                role: "readers".to_string(),
                grantor: "gpadmin".to_string(),
                admin_option: false,
            },
        ];
        assert_eq!(
            role_grants("bob", &memberships),
            "\n\nGRANT admins TO bob WITH ADMIN OPTION GRANTED BY gpadmin;\
             \nGRANT readers TO bob GRANTED BY gpadmin;"
        );
        assert_eq!(role_grants("bob", &[]), "");
    }

    #[test]
    fn test_create_tablespace() {
        assert_eq!(
            create_tablespace("fast", "fastfs"),
            "\n\nCREATE TABLESPACE fast FILESPACE fastfs;"
        );
    }
}
