//! # In-Memory Recipe Store
//!
//! A `RecipeStore` held in a `tokio::sync::RwLock`. Every trait method takes
//! the lock once, so each call is atomic on its own and the atomic rotation
//! runs under a single write lock.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use lib_common::connections::DbError;
use rand::Rng;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::recipe_logic::model::{
    Author, NewRecipe, PageRequest, Pagination, Recipe, RecipeDetail, RecipePage,
};
use crate::recipe_logic::store::RecipeStore;

#[derive(Default)]
struct Tables {
    // Insertion order doubles as creation order.
    recipes: Vec<Recipe>,
    users: HashMap<Uuid, String>,
}

impl Tables {
    fn pick_random_id(&self) -> Option<Uuid> {
        if self.recipes.is_empty() {
            return None;
        }
        let index = rand::rng().random_range(0..self.recipes.len());
        Some(self.recipes[index].id)
    }

    fn set_daily(&mut self, id: Uuid) -> u64 {
        let mut changed = 0;
        for recipe in self.recipes.iter_mut().filter(|r| r.id == id) {
            recipe.is_daily = true;
            changed += 1;
        }
        changed
    }

    fn clear_daily(&mut self) -> u64 {
        let mut changed = 0;
        for recipe in self.recipes.iter_mut().filter(|r| r.is_daily) {
            recipe.is_daily = false;
            changed += 1;
        }
        changed
    }

    fn newest_first(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.iter().rev()
    }
}

#[derive(Default)]
pub struct MemoryRecipeStore {
    tables: RwLock<Tables>,
}

impl MemoryRecipeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_author(&self, username: impl Into<String>) -> Uuid {
        let id = Uuid::new_v4();
        self.tables.write().await.users.insert(id, username.into());
        id
    }

    pub async fn insert(&self, new: NewRecipe) -> Recipe {
        let recipe = Recipe {
            id: Uuid::new_v4(),
            title: new.title,
            description: new.description,
            ingredients: new.ingredients,
            instructions: new.instructions,
            prep_time: new.prep_time,
            cook_time: new.cook_time,
            servings: new.servings,
            author_id: new.author_id,
            image_url: new.image_url,
            is_daily: false,
            created_at: Utc::now().naive_utc(),
        };
        self.tables.write().await.recipes.push(recipe.clone());
        recipe
    }

    /// Deletes a recipe; returns whether it existed.
    pub async fn remove(&self, id: Uuid) -> bool {
        let mut tables = self.tables.write().await;
        let before = tables.recipes.len();
        tables.recipes.retain(|r| r.id != id);
        tables.recipes.len() != before
    }

    pub async fn daily_ids(&self) -> Vec<Uuid> {
        self.tables
            .read()
            .await
            .recipes
            .iter()
            .filter(|r| r.is_daily)
            .map(|r| r.id)
            .collect()
    }

    pub async fn ids(&self) -> Vec<Uuid> {
        self.tables.read().await.recipes.iter().map(|r| r.id).collect()
    }
}

#[async_trait]
impl RecipeStore for MemoryRecipeStore {
    async fn clear_all_daily_flags(&self) -> Result<u64, DbError> {
        Ok(self.tables.write().await.clear_daily())
    }

    async fn select_random_recipe_id(&self) -> Result<Option<Uuid>, DbError> {
        Ok(self.tables.read().await.pick_random_id())
    }

    async fn set_daily_flag(&self, id: Uuid) -> Result<u64, DbError> {
        Ok(self.tables.write().await.set_daily(id))
    }

    async fn rotate_daily_atomically(&self) -> Result<Option<Uuid>, DbError> {
        let mut tables = self.tables.write().await;
        tables.clear_daily();
        let selected = tables.pick_random_id();
        if let Some(id) = selected {
            tables.set_daily(id);
        }
        Ok(selected)
    }

    async fn daily_recipe(&self) -> Result<Option<Recipe>, DbError> {
        let tables = self.tables.read().await;
        Ok(tables.recipes.iter().find(|r| r.is_daily).cloned())
    }

    async fn recipe_by_id(&self, id: Uuid) -> Result<Option<RecipeDetail>, DbError> {
        let tables = self.tables.read().await;
        Ok(tables.recipes.iter().find(|r| r.id == id).map(|recipe| {
            let author = recipe.author_id.and_then(|author_id| {
                tables.users.get(&author_id).map(|username| Author {
                    id: author_id,
                    username: username.clone(),
                })
            });
            RecipeDetail {
                recipe: recipe.clone(),
                author,
            }
        }))
    }

    async fn list_recipes(&self, request: &PageRequest) -> Result<RecipePage, DbError> {
        let tables = self.tables.read().await;
        let needle = request.search.as_deref().map(str::to_lowercase);
        let matching: Vec<&Recipe> = tables
            .newest_first()
            .filter(|r| match &needle {
                Some(n) => r.title.to_lowercase().contains(n),
                None => true,
            })
            .collect();

        let data = matching
            .iter()
            .skip(usize::try_from(request.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(request.limit).unwrap_or(0))
            .map(|r| (*r).clone())
            .collect();
        Ok(RecipePage {
            data,
            pagination: Pagination {
                total: matching.len() as i64,
                page: request.page,
                limit: request.limit,
            },
        })
    }

    async fn search_recipes(&self, term: &str, limit: i64) -> Result<Vec<Recipe>, DbError> {
        let tables = self.tables.read().await;
        let needle = term.to_lowercase();
        Ok(tables
            .newest_first()
            .filter(|r| {
                r.title.to_lowercase().contains(&needle)
                    || r.description.to_lowercase().contains(&needle)
            })
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<(), DbError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn atomic_rotation_flags_exactly_one_member() {
        let store = MemoryRecipeStore::new();
        let a = store.insert(NewRecipe::new("A", "a", "a")).await;
        let b = store.insert(NewRecipe::new("B", "b", "b")).await;

        for _ in 0..20 {
            let selected = store.rotate_daily_atomically().await.unwrap().unwrap();
            assert!(selected == a.id || selected == b.id);
            assert_eq!(store.daily_ids().await, vec![selected]);
        }
    }

    #[tokio::test]
    async fn set_flag_on_missing_recipe_changes_nothing() {
        let store = MemoryRecipeStore::new();
        assert_eq!(store.set_daily_flag(Uuid::new_v4()).await.unwrap(), 0);
        assert!(store.daily_ids().await.is_empty());
    }

    #[tokio::test]
    async fn list_is_newest_first_and_filters_titles() {
        let store = MemoryRecipeStore::new();
        store.insert(NewRecipe::new("Pasta al forno", "baked", "bake")).await;
        store.insert(NewRecipe::new("Green salad", "fresh", "toss")).await;
        store.insert(NewRecipe::new("PASTA fresca", "fresh pasta", "roll")).await;

        let page = store
            .list_recipes(&PageRequest {
                page: 1,
                limit: 10,
                search: Some("pasta".into()),
            })
            .await
            .unwrap();
        let titles: Vec<_> = page.data.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["PASTA fresca", "Pasta al forno"]);
        assert_eq!(page.pagination.total, 2);
    }

    #[tokio::test]
    async fn search_matches_description_too() {
        let store = MemoryRecipeStore::new();
        store.insert(NewRecipe::new("Salad", "Uses fresh BASIL", "toss")).await;
        store.insert(NewRecipe::new("Stew", "slow", "simmer")).await;

        let found = store.search_recipes("basil", 20).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Salad");
    }

    #[tokio::test]
    async fn detail_joins_the_author() {
        let store = MemoryRecipeStore::new();
        let author = store.add_author("chef_mario").await;
        let recipe = store
            .insert(NewRecipe::new("Bolognese", "sauce", "simmer").with_author(author))
            .await;

        let detail = store.recipe_by_id(recipe.id).await.unwrap().unwrap();
        assert_eq!(detail.author.unwrap().username, "chef_mario");
        assert!(store.recipe_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }
}
