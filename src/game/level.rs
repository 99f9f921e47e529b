use std::time::Duration;
use derive_more::*;
use glam::Vec2;
use hecs::{Entity, World};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::instrument;
use crate::{fit_preserving_aspect, AssetManager, Handle, LoadError, Readiness, Rect};
use crate::map::{Color, LayerKind, MapObject, Properties, TileRef, TiledMap};
use crate::game::{
    handle_player_input, held_item_properties, held_item_rect, pick_up, AnimationStatus, Body,
    Character, Enemy, EventQueue, GameConfig, GameEvent, Input, InventoryCount, Item, Player,
    PlayerStats, TileGroups,
};

/// Pixel size of a tile in the source maps.
pub const TILE_RESOLUTION: f32 = 256.0;

/// Names of the map layers a level knows how to instantiate.
pub mod layer_names {
    pub const GROUND: &str = "ground";
    pub const RIVER: &str = "river";
    pub const ROAD: &str = "road";
    pub const PEBBLES: &str = "pebbles";
    pub const PLANTS: &str = "plants";
    pub const TREES: &str = "trees";
    pub const ROCKS: &str = "rocks";
    pub const BUILDINGS: &str = "buildings";
    pub const PLAYER: &str = "player";
    pub const ENEMIES: &str = "enemies";
    pub const ITEMS: &str = "items";
    pub const BARRIERS: &str = "barriers";
    pub const COLLIDERS: &str = "colliders";
}

/// How the tiles of a named layer are instantiated.
struct LayerRule {
    name: &'static str,
    collider_ratio: Vec2,
    groups: TileGroups,
}

impl LayerRule {
    fn new(name: &'static str, collider_ratio: (f32, f32), groups: TileGroups) -> Self {
        Self {
            name,
            collider_ratio: Vec2::new(collider_ratio.0, collider_ratio.1),
            groups,
        }
    }

    /// Applies overrides from the layer's custom properties:
    /// `collider_width` and `collider_height` ratios, and `obstacle`.
    fn with_properties(mut self, properties: &Properties) -> Self {
        if let Some(width) = properties.get_float("collider_width") {
            self.collider_ratio.x = width as f32;
        }
        if let Some(height) = properties.get_float("collider_height") {
            self.collider_ratio.y = height as f32;
        }
        if let Some(obstacle) = properties.get_bool("obstacle") {
            self.groups.set(TileGroups::OBSTACLE, obstacle);
        }
        self
    }
}

/// Layers in the order they are set up.
/// Layers missing from a map are skipped.
fn layer_rules() -> [LayerRule; 13] {
    use layer_names::*;
    const FLAT: TileGroups = TileGroups::VISIBLE;
    let depth = TileGroups::VISIBLE | TileGroups::DEPTH;
    let solid = depth | TileGroups::OBSTACLE;
    let character = depth | TileGroups::DYNAMIC | TileGroups::VULNERABLE;
    [
        LayerRule::new(GROUND, (0.9, 0.9), FLAT),
        LayerRule::new(RIVER, (0.9, 0.9), FLAT),
        LayerRule::new(ROAD, (0.9, 0.9), FLAT),
        LayerRule::new(PEBBLES, (0.5, 0.5), solid),
        LayerRule::new(PLANTS, (0.9, 0.9), depth),
        LayerRule::new(TREES, (0.6, 0.4), solid),
        LayerRule::new(ROCKS, (0.7, 0.7), solid),
        // Buildings have irregular shapes, so their collisions come from the colliders layer
        LayerRule::new(BUILDINGS, (0.9, 0.9), depth),
        LayerRule::new(PLAYER, (1.0, 1.0), character),
        LayerRule::new(ENEMIES, (1.0, 1.0), character),
        LayerRule::new(ITEMS, (0.9, 0.9), ITEM_GROUPS),
        LayerRule::new(BARRIERS, (1.0, 1.0), TileGroups::OBSTACLE),
        LayerRule::new(COLLIDERS, (1.0, 1.0), TileGroups::OBSTACLE),
    ]
}

const ITEM_GROUPS: TileGroups = TileGroups::VISIBLE
    .union(TileGroups::DEPTH)
    .union(TileGroups::DYNAMIC)
    .union(TileGroups::ITEM);

const ITEM_COLLIDER_RATIO: Vec2 = Vec2::new(0.9, 0.9);

/// What a level entity looks like.
#[derive(Clone, PartialEq, Debug)]
pub enum Sprite {
    Tile(TileRef),
    Character {
        name: String,
        status: AnimationStatus,
        frame: usize,
        /// Fraction of full health left.
        health: f32,
    },
    Item { name: String },
}

/// Component of an item lying on the ground.
#[derive(Clone, Debug)]
pub struct GroundItem(pub Item);

/// Sprite to draw at a rectangle in screen space.
#[derive(Clone, PartialEq, Debug)]
pub struct DrawCommand {
    pub sprite: Sprite,
    pub rect: Rect,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum LevelOutcome {
    Playing,
    /// The player died. The same level should be played again.
    Restart,
    /// Every enemy was defeated.
    Completed,
}

/// A playable map with its entities.
pub struct Level {
    level_id: u32,
    map: Handle<TiledMap>,
    background_color: Color,
    viewport: Vec2,
    tile_size: f32,
    scale_factor: f32,
    world: World,
    player: Option<Entity>,
    enemies_spawned: usize,
    set_up_done: bool,
    outcome: LevelOutcome,
    rng: SmallRng,
    draw_list: Vec<DrawCommand>,
}

impl Level {

    /// Loads the map of a level. Ids below 1 are treated as 1.
    /// Entities are only created by [`Level::set_up_map`].
    pub fn new(config: &GameConfig, level_id: u32, assets: &AssetManager) -> Result<Self, LevelError> {
        let level_id = level_id.max(1);
        let level_config = config.level(level_id).ok_or(LevelError::NoSuchLevel { level_id })?;
        let map = assets.load::<TiledMap, _>(&level_config.map)?;
        if assets.readiness_of(&map) == Readiness::Failed {
            return Err(LevelError::MapFailed { path: level_config.map.clone() });
        }

        let viewport = Vec2::from(config.viewport);
        let min_tile_count = config.min_tile_count.max(1) as f32;
        let tile_size = (viewport.min_element() / min_tile_count).floor().max(1.0);
        let map_tile_width = assets
            .get(&map)
            .map(|map| map.tile_width)
            .filter(|tile_width| *tile_width > 0)
            .map(|tile_width| tile_width as f32)
            .unwrap_or(TILE_RESOLUTION);
        let [r, g, b] = level_config.background_color;

        log::info!("Loaded level {level_id} from {}", level_config.map);
        Ok(Self {
            level_id,
            map,
            background_color: Color::rgb(r, g, b),
            viewport,
            tile_size,
            scale_factor: map_tile_width / tile_size,
            world: World::new(),
            player: None,
            enemies_spawned: 0,
            set_up_done: false,
            outcome: LevelOutcome::Playing,
            rng: SmallRng::from_entropy(),
            draw_list: Vec::new(),
        })
    }

    /// Replaces the random source used for item drops.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    /// Spawns entities for every known layer of the map.
    /// Only the first call has an effect.
    pub fn set_up_map(
        &mut self,
        config: &GameConfig,
        assets: &AssetManager,
        player: (Player, Character),
    ) -> Result<(), LevelError> {
        if self.set_up_done { return Ok(()) }
        let map = assets.get(&self.map).ok_or_else(|| LevelError::MapFailed {
            path: config.level(self.level_id).map(|level| level.map.clone()).unwrap_or_default(),
        })?;
        self.set_up_done = true;

        let mut player = Some(player);
        for rule in layer_rules() {
            let Some(layer) = map.layer_by_name(rule.name) else { continue };
            if !layer.visible { continue }
            let rule = rule.with_properties(&layer.properties);
            let offset = layer.offset / self.scale_factor;
            match &layer.kind {
                LayerKind::Tiles(tile_layer) => {
                    for (x, y, gid) in tile_layer.tiles() {
                        let origin = Vec2::new(x as f32, y as f32) * self.tile_size + offset;
                        if rule.name == layer_names::PLAYER {
                            match player.take() {
                                Some(player) => self.spawn_player(player, origin, &rule),
                                None => log::warn!("Ignoring extra player tile at ({x}, {y})"),
                            }
                            continue;
                        }
                        let Some(tile) = map.resolve(gid) else {
                            log::warn!("Tile {} of layer '{}' has no tileset", gid.id, rule.name);
                            continue;
                        };
                        let bounds = Vec2::splat(self.tile_size);
                        let size = match tile_image_size(&map, assets, tile) {
                            Some(image_size) => fit_preserving_aspect(image_size, bounds),
                            None => bounds,
                        };
                        let body = Body::new(Rect { origin, size }, rule.collider_ratio);
                        self.world.spawn((body, rule.groups, Sprite::Tile(tile)));
                    }
                },
                LayerKind::Objects(objects) => {
                    for object in objects.iter() {
                        self.spawn_object(config, &map, &rule, object, offset);
                    }
                },
                LayerKind::Group(_) | LayerKind::Image(_) => {
                    log::warn!("Layer '{}' is neither a tile layer nor an object layer", rule.name);
                },
            }
        }

        if let Some(player) = player {
            log::warn!("Map has no player tile, spawning player at the origin");
            if let Some(rule) = layer_rules().into_iter().find(|rule| rule.name == layer_names::PLAYER) {
                self.spawn_player(player, Vec2::ZERO, &rule);
            }
        }
        log::info!(
            "Set up level {} with {} entities and {} enemies",
            self.level_id,
            self.world.len(),
            self.enemies_spawned,
        );
        Ok(())
    }

    fn spawn_player(&mut self, (player, character): (Player, Character), origin: Vec2, rule: &LayerRule) {
        let rect = Rect { origin, size: Vec2::splat(self.tile_size) };
        let body = Body::new(rect, rule.collider_ratio);
        self.player = Some(self.world.spawn((body, rule.groups, player, character)));
    }

    fn spawn_object(&mut self, config: &GameConfig, map: &TiledMap, rule: &LayerRule, object: &MapObject, offset: Vec2) {
        if !object.visible { return }

        // Tile objects are anchored at their bottom-left corner
        let top = match object.gid {
            Some(_) => object.y - object.height,
            None => object.y,
        };
        let origin = Vec2::new(object.x, top) / self.scale_factor + offset;
        let size = Vec2::new(object.width, object.height) / self.scale_factor;

        match rule.name {
            layer_names::ENEMIES => {
                let Some(def) = config.enemy(&object.name) else {
                    log::warn!("Unknown enemy '{}'", object.name);
                    return;
                };
                let (enemy, character) = Enemy::from_def(config, def);
                let rect = Rect { origin, size: Vec2::splat(self.tile_size) };
                let body = Body::new(rect, rule.collider_ratio);
                self.world.spawn((body, rule.groups, enemy, character));
                self.enemies_spawned += 1;
            },
            layer_names::ITEMS => {
                let Some(def) = config.item(&object.name) else {
                    log::warn!("Unknown item '{}'", object.name);
                    return;
                };
                let item = Item::new(def.clone());
                let item_size = self.item_size(&item);
                let center = Rect { origin, size }.center();
                self.spawn_ground_item(item, Rect::from_center(center, item_size));
            },
            _ => match object.gid.and_then(|gid| map.resolve(gid)) {
                Some(tile) => {
                    let body = Body::new(Rect { origin, size }, rule.collider_ratio);
                    self.world.spawn((body, rule.groups, Sprite::Tile(tile)));
                },
                None if object.gid.is_none() && !rule.groups.contains(TileGroups::VISIBLE) => {
                    let body = Body::new(Rect { origin, size }, rule.collider_ratio);
                    self.world.spawn((body, rule.groups));
                },
                None => log::warn!("Skipping object {} of layer '{}'", object.id, rule.name),
            },
        }
    }

    fn item_size(&self, item: &Item) -> Vec2 {
        Vec2::from(item.def().size) * self.tile_size
    }

    fn spawn_ground_item(&mut self, item: Item, rect: Rect) {
        let sprite = Sprite::Item { name: String::from(item.name()) };
        let body = Body::new(rect, ITEM_COLLIDER_RATIO);
        self.world.spawn((body, ITEM_GROUPS, sprite, GroundItem(item)));
    }

    /// Runs a single frame.
    #[instrument(skip_all)]
    pub fn update(&mut self, delta: Duration, input: &Input, events: &mut EventQueue) -> LevelOutcome {
        if !self.set_up_done || self.outcome != LevelOutcome::Playing {
            return self.outcome;
        }
        let Some(player_entity) = self.player else { return self.outcome };

        let screen = self.screen_rect();
        let obstacles = self.obstacles_in(&screen);
        self.update_player(player_entity, delta, input, &obstacles, events);
        self.update_enemies(player_entity, delta, &obstacles);
        self.resolve_weapon_hits(delta, events);
        self.pick_up_items(player_entity, events);
        self.resolve_deaths(player_entity, events);
        self.update_draw_list();
        self.outcome
    }

    /// Area of the level visible on screen, centered on the player.
    pub fn screen_rect(&self) -> Rect {
        let center = self.player_center().unwrap_or(self.viewport / 2.0);
        Rect::from_center(center, self.viewport)
    }

    fn obstacles_in(&self, screen: &Rect) -> Vec<(Entity, Rect)> {
        self.world
            .query::<(&Body, &TileGroups)>()
            .iter()
            .filter(|(_, (body, groups))| groups.contains(TileGroups::OBSTACLE) && body.rect.intersects(screen))
            .map(|(entity, (body, _))| (entity, body.collider))
            .collect()
    }

    fn update_player(
        &mut self,
        entity: Entity,
        delta: Duration,
        input: &Input,
        obstacles: &[(Entity, Rect)],
        events: &mut EventQueue,
    ) {
        let tile_size = self.tile_size;
        let Ok((character, body)) = self.world.query_one_mut::<(&mut Character, &mut Body)>(entity) else { return };
        character.tick(delta);
        handle_player_input(character, input, events);
        let displacement = character.displacement(tile_size, delta);
        body.move_and_collide(displacement, character.direction, &others(obstacles, entity));
    }

    fn update_enemies(&mut self, player_entity: Entity, delta: Duration, obstacles: &[(Entity, Rect)]) {
        let Some(player_center) = self.player_center() else { return };
        let stealth = self.world
            .get::<&Player>(player_entity)
            .map(|player| player.stealth_multiplier)
            .unwrap_or(1.0);
        let tile_size = self.tile_size;
        for (entity, (enemy, character, body)) in self.world.query_mut::<(&mut Enemy, &mut Character, &mut Body)>() {
            character.tick(delta);
            enemy.tick(delta);
            if let Some(item) = enemy.think(character, body.center(), player_center, stealth, tile_size) {
                log::trace!("{} used {item}", character.name);
            }
            let displacement = character.displacement(tile_size, delta);
            body.move_and_collide(displacement, character.direction, &others(obstacles, entity));
        }
    }

    /// Weapons in use damage every vulnerable character they overlap, except their owner.
    fn resolve_weapon_hits(&mut self, delta: Duration, events: &mut EventQueue) {
        let tile_size = self.tile_size;
        let seconds = delta.as_secs_f32();
        let attacks: Vec<(Entity, Rect, f32)> = self.world
            .query::<(&Character, &Body)>()
            .iter()
            .filter_map(|(entity, (character, body))| {
                let weapon = character.weapon_collider(&body.rect, tile_size)?;
                let damage = character.inventory.held()?.damage() * character.stats.damage_multiplier * seconds;
                Some((entity, weapon, damage))
            })
            .collect();
        if attacks.is_empty() { return }

        for (entity, (character, body, groups)) in self.world.query_mut::<(&mut Character, &Body, &TileGroups)>() {
            if !groups.contains(TileGroups::VULNERABLE) || character.is_dead() { continue }
            let damage: f32 = attacks
                .iter()
                .filter(|(attacker, weapon, _)| *attacker != entity && weapon.intersects(&body.collider))
                .map(|(_, _, damage)| damage)
                .sum();
            if damage <= 0.0 { continue }
            if character.receive_damage(damage).feedback {
                events.push(GameEvent::CharacterDamaged { name: character.name.clone() });
            }
        }
    }

    fn pick_up_items(&mut self, player_entity: Entity, events: &mut EventQueue) {
        let Ok(player_collider) = self.world.get::<&Body>(player_entity).map(|body| body.collider) else { return };
        let touched: Vec<Entity> = self.world
            .query::<(&GroundItem, &Body)>()
            .iter()
            .filter(|(_, (_, body))| body.collider.intersects(&player_collider))
            .map(|(entity, _)| entity)
            .collect();
        for entity in touched {
            let Ok(GroundItem(item)) = self.world.remove_one::<GroundItem>(entity) else { continue };
            if let Err(err) = self.world.despawn(entity) {
                log::error!("Failed to remove picked up item: {err}");
            }
            if let Ok(mut character) = self.world.get::<&mut Character>(player_entity) {
                pick_up(&mut character, item, events);
            }
        }
    }

    fn resolve_deaths(&mut self, player_entity: Entity, events: &mut EventQueue) {
        let player_died = self.world
            .get::<&mut Character>(player_entity)
            .map(|mut character| {
                if !character.is_dead() { return false }
                character.stats.current_health = character.stats.full_health;
                true
            })
            .unwrap_or(false);
        if player_died {
            log::info!("Player died on level {}", self.level_id);
            self.outcome = LevelOutcome::Restart;
            events.push(GameEvent::PlayerDied { level_id: self.level_id });
            return;
        }

        let dead: Vec<Entity> = self.world
            .query::<(&Enemy, &Character)>()
            .iter()
            .filter(|(_, (_, character))| character.is_dead())
            .map(|(entity, _)| entity)
            .collect();
        if dead.is_empty() { return }

        for entity in dead {
            let Ok((enemy, character, body)) = self.world.query_one_mut::<(&Enemy, &mut Character, &Body)>(entity) else { continue };
            let drop_point = body.rect.mid_bottom();
            let name = character.name.clone();
            let dropped = enemy.roll_drops(character, &mut self.rng);
            if let Err(err) = self.world.despawn(entity) {
                log::error!("Failed to remove dead enemy: {err}");
            }
            log::debug!("{name} died, dropping {} items", dropped.len());
            events.push(GameEvent::EnemyDied { name });

            // Dropped items land at the feet of their previous owner
            for item in dropped {
                let size = self.item_size(&item);
                let origin = drop_point - Vec2::new(size.x / 2.0, 0.0);
                events.push(GameEvent::ItemDropped { name: String::from(item.name()) });
                self.spawn_ground_item(item, Rect { origin, size });
            }
        }

        if self.enemies_spawned > 0 && self.enemy_count() == 0 {
            log::info!("Level {} completed", self.level_id);
            self.outcome = LevelOutcome::Completed;
            events.push(GameEvent::LevelCompleted { level_id: self.level_id });
        }
    }

    /// Flat sprites first, then depth sprites from top to bottom.
    /// Only sprites on screen are kept.
    fn update_draw_list(&mut self) {
        let screen = self.screen_rect();
        let offset = -screen.origin;
        let tile_size = self.tile_size;
        let to_screen = |rect: Rect| Rect { origin: rect.origin + offset, size: rect.size };

        let mut flat = Vec::new();
        let mut depth = Vec::new();
        let mut query = self.world.query::<(&Body, &TileGroups, Option<&Sprite>, Option<&Character>)>();
        for (_, (body, groups, sprite, character)) in query.iter() {
            if !groups.contains(TileGroups::VISIBLE) || !body.rect.intersects(&screen) { continue }
            let sprite = match (sprite, character) {
                (Some(sprite), _) => sprite.clone(),
                (None, Some(character)) => Sprite::Character {
                    name: character.name.clone(),
                    status: character.status(),
                    frame: character.animation.frame,
                    health: character.health_ratio(),
                },
                (None, None) => continue,
            };
            let command = DrawCommand { sprite, rect: to_screen(body.rect) };
            if groups.contains(TileGroups::DEPTH) {
                depth.push(command);
            }
            else {
                flat.push(command);
            }

            // Items being used are drawn in the owner's hand
            let Some(character) = character else { continue };
            let Some(item) = character.inventory.held().filter(|item| item.is_in_use()) else { continue };
            let size = Vec2::from(item.def().size) * tile_size;
            let rect = held_item_rect(&body.rect, character.status().facing, size, tile_size);
            depth.push(DrawCommand {
                sprite: Sprite::Item { name: String::from(item.name()) },
                rect: to_screen(rect),
            });
        }
        drop(query);

        depth.sort_by(|a, b| a.rect.center().y.total_cmp(&b.rect.center().y));
        flat.extend(depth);
        self.draw_list = flat;
    }

    pub fn level_id(&self) -> u32 { self.level_id }
    pub fn map(&self) -> Handle<TiledMap> { self.map }
    pub fn background_color(&self) -> Color { self.background_color }
    pub fn tile_size(&self) -> f32 { self.tile_size }
    pub fn scale_factor(&self) -> f32 { self.scale_factor }
    pub fn outcome(&self) -> LevelOutcome { self.outcome }
    pub fn is_done(&self) -> bool { self.outcome != LevelOutcome::Playing }
    pub fn world(&self) -> &World { &self.world }

    /// Sprites of the last frame, in drawing order.
    pub fn draw_list(&self) -> &[DrawCommand] {
        &self.draw_list
    }

    pub fn player_entity(&self) -> Option<Entity> {
        self.player
    }

    pub fn player_center(&self) -> Option<Vec2> {
        let entity = self.player?;
        self.world.get::<&Body>(entity).ok().map(|body| body.rect.center())
    }

    pub fn player_body(&self) -> Option<Body> {
        let entity = self.player?;
        self.world.get::<&Body>(entity).ok().map(|body| *body)
    }

    pub fn player_character(&self) -> Option<hecs::Ref<'_, Character>> {
        self.world.get::<&Character>(self.player?).ok()
    }

    /// Stats and inventory of the player, in their saved form.
    pub fn player_progress(&self) -> Option<(PlayerStats, Vec<InventoryCount>)> {
        let entity = self.player?;
        let mut query = self.world.query_one::<(&Player, &Character)>(entity).ok()?;
        let (player, character) = query.get()?;
        let progress = (player.to_stats(character), character.inventory.to_counts());
        Some(progress)
    }

    /// Text describing the player's held item.
    pub fn held_item_properties(&self) -> Option<String> {
        held_item_properties(&*self.player_character()?)
    }

    pub fn enemy_count(&self) -> usize {
        self.world.query::<&Enemy>().iter().count()
    }

    /// Number of entities belonging to every group in `groups`.
    pub fn count(&self, groups: TileGroups) -> usize {
        self.world
            .query::<&TileGroups>()
            .iter()
            .filter(|(_, entity_groups)| entity_groups.contains(groups))
            .count()
    }
}

fn tile_image_size(map: &TiledMap, assets: &AssetManager, tile: TileRef) -> Option<Vec2> {
    let map_tileset = map.tilesets.get(tile.tileset_index)?;
    let tileset = assets.get(&map_tileset.tileset)?;
    tileset.tile_image_size(tile.tile_id).map(|size| size.as_vec2())
}

/// Obstacle colliders, excluding those of `own`.
fn others(obstacles: &[(Entity, Rect)], own: Entity) -> Vec<Rect> {
    obstacles
        .iter()
        .filter(|(entity, _)| *entity != own)
        .map(|(_, collider)| *collider)
        .collect()
}

#[derive(Error, Display, From, Debug)]
pub enum LevelError {
    #[display(fmt="{_0}")]
    LoadError(LoadError),
    #[display(fmt="No level with id {level_id}")]
    #[from(ignore)]
    NoSuchLevel { level_id: u32 },
    #[display(fmt="Map '{path}' failed to load")]
    #[from(ignore)]
    MapFailed { path: String },
}
