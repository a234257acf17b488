//! Shared fixture world for unit tests.

use std::collections::HashMap;

use world_model::{Entity, EntityId, GraphView, Point, Prominence, Relationship, WorldGraph};

pub(crate) struct Realm {
    pub world: WorldGraph,
    ids: HashMap<&'static str, EntityId>,
}

impl Realm {
    pub fn id(&self, name: &str) -> EntityId {
        self.ids[name]
    }

    pub fn entity(&self, name: &str) -> &Entity {
        self.world.entity(self.id(name)).expect("fixture entity")
    }

    /// Raw-ID reference string for an entity.
    pub fn reference(&self, name: &str) -> String {
        self.id(name).to_string()
    }

    pub fn names(&self, entities: &[&Entity]) -> Vec<String> {
        entities.iter().map(|e| e.name.clone()).collect()
    }
}

/// Two factions at war, four people and a town.
///
/// - Ama (hero, aurora, renowned) and Bren (merchant, aurora, marginal) are
///   Lanterns; both are enemies of Cato.
/// - Cato (rogue, nightshelf, forgotten) and Dara (mystic, nightshelf,
///   mythic, dead) are Ravens.
/// - Lanterns are at war with Ravens. Ama lives in Fenmoor.
pub(crate) fn realm() -> Realm {
    let mut world = WorldGraph::new();
    let mut ids = HashMap::new();

    let people = [
        Entity::new("npc", "hero", "Ama")
            .with_status("alive")
            .with_culture("aurora")
            .with_prominence(Prominence::Renowned)
            .with_tag("brave")
            .with_tag_value("oath", "sun")
            .with_coordinates(Point::new(0.0, 0.0))
            .with_created_at(0)
            .with_updated_at(5),
        Entity::new("npc", "merchant", "Bren")
            .with_status("alive")
            .with_culture("aurora")
            .with_prominence(Prominence::Marginal)
            .with_tag("trader")
            .with_coordinates(Point::new(30.0, 40.0))
            .with_created_at(10),
        Entity::new("npc", "rogue", "Cato")
            .with_status("alive")
            .with_culture("nightshelf")
            .with_prominence(Prominence::Forgotten)
            .with_tag("outlaw")
            .with_coordinates(Point::new(100.0, 0.0))
            .with_created_at(2),
        Entity::new("npc", "mystic", "Dara")
            .with_status("dead")
            .with_culture("nightshelf")
            .with_prominence(Prominence::Mythic),
        Entity::new("faction", "guild", "Lanterns")
            .with_culture("aurora")
            .with_prominence(Prominence::Recognized),
        Entity::new("faction", "cult", "Ravens")
            .with_culture("nightshelf")
            .with_prominence(Prominence::Renowned),
        Entity::new("location", "town", "Fenmoor").with_coordinates(Point::new(0.0, 0.0)),
    ];
    let keys = ["ama", "bren", "cato", "dara", "lanterns", "ravens", "fenmoor"];

    for (key, entity) in keys.into_iter().zip(people) {
        ids.insert(key, world.add_entity(entity).expect("unique fixture id"));
    }

    let edges = [
        Relationship::new("member_of", ids["ama"], ids["lanterns"]).with_strength(0.9),
        Relationship::new("member_of", ids["bren"], ids["lanterns"]),
        Relationship::new("member_of", ids["cato"], ids["ravens"]),
        Relationship::new("member_of", ids["dara"], ids["ravens"]),
        Relationship::new("enemy_of", ids["ama"], ids["cato"]).with_strength(0.8),
        Relationship::new("enemy_of", ids["bren"], ids["cato"]).with_strength(0.4),
        Relationship::new("at_war_with", ids["lanterns"], ids["ravens"]),
        Relationship::new("resident_of", ids["ama"], ids["fenmoor"]),
    ];
    for edge in edges {
        world.add_relationship(edge).expect("fixture endpoints exist");
    }

    world.set_pressure("conflict", 60.0);
    world.set_pressure("prosperity", 30.0);
    world.set_pressure("magic", 10.0);
    world.set_tick(20);
    world.set_era("age_of_embers");

    Realm { world, ids }
}
