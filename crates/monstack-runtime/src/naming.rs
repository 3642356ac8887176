//! Deterministic names for the containers and network of a cloned stack.
//!
//! Names combine the service role, its external port and the stack id, so
//! clones with different stack ids never collide.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    AlertRouter,
    MetricsStore,
    DashboardServer,
}

impl Role {
    pub fn prefix(self) -> &'static str {
        match self {
            Role::AlertRouter => "aalert",
            Role::MetricsStore => "aprom",
            Role::DashboardServer => "agraf",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::AlertRouter => "alert router",
            Role::MetricsStore => "metrics store",
            Role::DashboardServer => "dashboard server",
        };
        f.write_str(name)
    }
}

pub fn container_name(role: Role, port: u16, stack_id: u32) -> String {
    format!("{}-s{stack_id}-{port}", role.prefix())
}

pub fn network_name(stack_id: u32) -> String {
    format!("monstack-net-{stack_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_deterministic() {
        assert_eq!(container_name(Role::MetricsStore, 9091, 1), "aprom-s1-9091");
        assert_eq!(container_name(Role::DashboardServer, 3001, 1), "agraf-s1-3001");
        assert_eq!(container_name(Role::AlertRouter, 9095, 2), "aalert-s2-9095");
        assert_eq!(network_name(3), "monstack-net-3");
    }

    #[test]
    fn stack_ids_do_not_collide() {
        for role in [Role::AlertRouter, Role::MetricsStore, Role::DashboardServer] {
            assert_ne!(container_name(role, 9091, 1), container_name(role, 9091, 2));
        }
        assert_ne!(network_name(1), network_name(2));
    }
}
