use chrono::Weekday;
use serde::{Deserialize, Serialize};

use super::rules::{BadgeKind, BadgeRule, DayCondition};

/// Static catalog entry. Metadata plus the typed rule that unlocks it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub rule: BadgeRule,
}

impl BadgeDefinition {
    pub const fn kind(&self) -> BadgeKind {
        self.rule.kind()
    }

    pub const fn threshold(&self) -> u32 {
        self.rule.threshold()
    }

    pub fn summary(&self) -> BadgeSummary {
        BadgeSummary {
            id: self.id.to_string(),
            name: self.name.to_string(),
            description: self.description.to_string(),
            icon: self.icon.to_string(),
            kind: self.kind(),
            threshold: self.threshold(),
        }
    }
}

/// Catalog metadata as persisted and returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    #[serde(rename = "type")]
    pub kind: BadgeKind,
    pub threshold: u32,
}

#[derive(Debug, Clone)]
pub struct BadgeCatalog {
    badges: Vec<BadgeDefinition>,
}

impl BadgeCatalog {
    pub fn standard() -> Self {
        Self {
            badges: standard_badges(),
        }
    }

    pub fn from_definitions(badges: Vec<BadgeDefinition>) -> Self {
        Self { badges }
    }

    pub fn badges(&self) -> &[BadgeDefinition] {
        &self.badges
    }

    pub fn get(&self, id: &str) -> Option<&BadgeDefinition> {
        self.badges.iter().find(|badge| badge.id == id)
    }

    pub fn of_kind(&self, kind: BadgeKind) -> Vec<&BadgeDefinition> {
        self.badges
            .iter()
            .filter(|badge| badge.kind() == kind)
            .collect()
    }

    pub fn summaries(&self) -> Vec<BadgeSummary> {
        self.badges.iter().map(BadgeDefinition::summary).collect()
    }
}

fn standard_badges() -> Vec<BadgeDefinition> {
    vec![
        BadgeDefinition {
            id: "streak-1",
            name: "Iniciante",
            description: "Mantenha um streak de 3 dias",
            icon: "🌱",
            rule: BadgeRule::StreakAtLeast(3),
        },
        BadgeDefinition {
            id: "streak-2",
            name: "Dedicado",
            description: "Mantenha um streak de 5 dias",
            icon: "🔥",
            rule: BadgeRule::StreakAtLeast(5),
        },
        BadgeDefinition {
            id: "streak-3",
            name: "Veterano",
            description: "Mantenha um streak de 10 dias",
            icon: "⚡",
            rule: BadgeRule::StreakAtLeast(10),
        },
        BadgeDefinition {
            id: "streak-4",
            name: "Lendário",
            description: "Mantenha um streak de 20 dias",
            icon: "👑",
            rule: BadgeRule::StreakAtLeast(20),
        },
        BadgeDefinition {
            id: "total-1",
            name: "Primeiro Passo",
            description: "Registre presença por 5 dias no total",
            icon: "👣",
            rule: BadgeRule::TotalDaysAtLeast(5),
        },
        BadgeDefinition {
            id: "total-2",
            name: "Frequentador",
            description: "Registre presença por 15 dias no total",
            icon: "📚",
            rule: BadgeRule::TotalDaysAtLeast(15),
        },
        BadgeDefinition {
            id: "total-3",
            name: "Estudioso",
            description: "Registre presença por 30 dias no total",
            icon: "🎓",
            rule: BadgeRule::TotalDaysAtLeast(30),
        },
        BadgeDefinition {
            id: "total-4",
            name: "Mestre",
            description: "Registre presença por 50 dias no total",
            icon: "🏆",
            rule: BadgeRule::TotalDaysAtLeast(50),
        },
        BadgeDefinition {
            id: "consistency-1",
            name: "Semana Perfeita",
            description: "Registre presença todos os dias úteis da semana",
            icon: "📅",
            rule: BadgeRule::WeeklyDaysAtLeast(5),
        },
        BadgeDefinition {
            id: "consistency-2",
            name: "Mês Dourado",
            description: "Registre presença por 20 dias em um mês",
            icon: "🌟",
            rule: BadgeRule::MonthlyDaysAtLeast(20),
        },
        BadgeDefinition {
            id: "special-1",
            name: "Guerreiro de Segunda",
            description: "Registre presença em uma segunda-feira",
            icon: "⚔️",
            rule: BadgeRule::DayEvent(DayCondition::Weekday(Weekday::Mon)),
        },
        BadgeDefinition {
            id: "special-2",
            name: "Anti-Preguiça",
            description: "Registre presença em um feriado",
            icon: "💪",
            rule: BadgeRule::DayEvent(DayCondition::Holiday),
        },
        BadgeDefinition {
            id: "special-3",
            name: "Sem Desculpas",
            description: "Registre presença em um dia chuvoso",
            icon: "☔",
            rule: BadgeRule::DayEvent(DayCondition::RainyDay),
        },
        BadgeDefinition {
            id: "special-4",
            name: "Maratonista",
            description: "Registre presença no fim de semana",
            icon: "🏃",
            rule: BadgeRule::DayEvent(DayCondition::Weekend),
        },
        BadgeDefinition {
            id: "special-5",
            name: "Pontual Master",
            description: "Chegue antes das 8:15",
            icon: "⏰",
            rule: BadgeRule::DayEvent(DayCondition::ArrivalNoLaterThan { hour: 8, minute: 15 }),
        },
        BadgeDefinition {
            id: "special-6",
            name: "Rei do Quincas",
            description: "Registre presença no Quincas",
            icon: "👑",
            rule: BadgeRule::DayEvent(DayCondition::LocationIs("Quincas")),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn standard_catalog_has_unique_ids() {
        let catalog = BadgeCatalog::standard();
        let ids: HashSet<_> = catalog.badges().iter().map(|badge| badge.id).collect();
        assert_eq!(ids.len(), catalog.badges().len());
        assert_eq!(catalog.badges().len(), 16);
    }

    #[test]
    fn groups_badges_by_kind() {
        let catalog = BadgeCatalog::standard();
        assert_eq!(catalog.of_kind(BadgeKind::Streak).len(), 4);
        assert_eq!(catalog.of_kind(BadgeKind::TotalDays).len(), 4);
        assert_eq!(catalog.of_kind(BadgeKind::Consistency).len(), 2);
        assert_eq!(catalog.of_kind(BadgeKind::Special).len(), 6);
    }

    #[test]
    fn summary_serializes_kind_as_type() {
        let catalog = BadgeCatalog::standard();
        let badge = catalog.get("streak-2").expect("badge exists");
        let json = serde_json::to_value(badge.summary()).expect("serializes");
        assert_eq!(json["type"], "STREAK");
        assert_eq!(json["threshold"], 5);
        assert_eq!(json["name"], "Dedicado");
    }
}
