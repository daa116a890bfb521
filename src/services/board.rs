use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use validator::Validate;

use crate::{
    config::ContentLimits,
    error::{AppError, Result},
    models::{
        comment::{Comment, CommentThread, CreateCommentRequest},
        post::{CreatePostRequest, Post, PostDetail, PostQuery},
        profile::ActorIdentity,
    },
    services::{
        identity::IdentityResolver,
        storage::{keys, CollectionStore},
        votes::{cast_vote, DurablePostLedger, VoteLedger, VoteResult},
    },
    utils::{
        listing::{self, ListingQuery},
        threading::build_comment_tree,
        validation::require_text,
    },
};

/// Ids at or below this are reserved for seed posts.
const SEED_ID_CEILING: u64 = 100;

/// Posts are the store collection overlaid on the read-only seed set. A
/// mutation of a seed post copies it into the store, and the stored copy
/// shadows the seed from then on.
#[derive(Clone)]
pub struct BoardService {
    store: CollectionStore,
    seed_posts: Arc<Vec<Post>>,
    resolver: IdentityResolver,
    ledger: DurablePostLedger,
    limits: ContentLimits,
}

impl BoardService {
    pub fn new(
        store: CollectionStore,
        seed_posts: Vec<Post>,
        resolver: IdentityResolver,
        limits: ContentLimits,
    ) -> Self {
        Self {
            ledger: DurablePostLedger::new(store.clone()),
            store,
            seed_posts: Arc::new(seed_posts),
            resolver,
            limits,
        }
    }

    /// Store posts first, then seed posts not shadowed by a stored copy.
    pub fn list_posts(&self) -> Vec<Post> {
        let mut posts: Vec<Post> = self.store.load(keys::BOARD_POSTS);
        let seeds: Vec<Post> = self
            .seed_posts
            .iter()
            .filter(|seed| !posts.iter().any(|p| p.id == seed.id))
            .cloned()
            .collect();
        posts.extend(seeds);
        posts
    }

    pub fn browse_posts(&self, query: &PostQuery) -> Result<Vec<Post>> {
        let listing = ListingQuery::from_query(query)
            .ok_or_else(|| AppError::bad_request("Unknown category or sort"))?;
        let posts = listing::apply(self.list_posts(), &listing);
        debug!("Board listing returned {} posts", posts.len());
        Ok(posts)
    }

    fn find_post(&self, id: u64) -> Result<Post> {
        self.list_posts()
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::not_found("Post"))
    }

    /// Every call counts one view.
    pub fn get_post(&self, id: u64) -> Result<Post> {
        self.update_post(id, |post| post.views += 1)
    }

    pub fn get_post_detail(&self, id: u64) -> Result<PostDetail> {
        let post = self.get_post(id)?;
        let comments = self.list_comments(id);

        Ok(PostDetail {
            recommended: self.ledger.contains(&id),
            comment_total: comments.len(),
            comments: build_comment_tree(&comments),
            post,
        })
    }

    pub async fn create_post(
        &self,
        request: CreatePostRequest,
        actor: Option<&ActorIdentity>,
    ) -> Result<Post> {
        let actor = actor.ok_or_else(|| AppError::unauthorized("Login required to write"))?;

        request.validate()?;
        let title = require_text("Title", &request.title, self.limits.max_title_length)?;
        let content = require_text("Content", &request.content, self.limits.max_post_length)?;

        let author = self.resolver.resolve(actor).await;

        let mut posts: Vec<Post> = self.store.load(keys::BOARD_POSTS);
        let id = posts
            .iter()
            .chain(self.seed_posts.iter())
            .map(|p| p.id)
            .fold(SEED_ID_CEILING, u64::max)
            .checked_add(1)
            .ok_or_else(|| AppError::internal("Post id space exhausted"))?;

        let post = Post {
            id,
            category: request.category,
            title,
            author,
            date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            views: 0,
            recommends: 0,
            comments: 0,
            content: Some(content),
            user_id: Some(actor.id.clone()),
        };

        posts.insert(0, post.clone());
        self.store.save(keys::BOARD_POSTS, &posts)?;

        info!("Post {} created by {}", post.id, actor.id);
        Ok(post)
    }

    /// Returns `false` when `id` is a seed post, which cannot be deleted.
    pub fn delete_post(&self, id: u64, actor: Option<&ActorIdentity>) -> Result<bool> {
        let actor = actor.ok_or_else(|| AppError::unauthorized("Login required"))?;

        if self.seed_posts.iter().any(|p| p.id == id) {
            debug!("Ignoring delete of seed post {}", id);
            return Ok(false);
        }

        let mut posts: Vec<Post> = self.store.load(keys::BOARD_POSTS);
        let index = posts
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| AppError::not_found("Post"))?;

        if !posts[index].is_owned_by(&actor.id) {
            return Err(AppError::forbidden("Only the author can delete this post"));
        }

        posts.remove(index);
        self.store.save(keys::BOARD_POSTS, &posts)?;

        info!("Post {} deleted by {}", id, actor.id);
        Ok(true)
    }

    pub fn list_comments(&self, post_id: u64) -> Vec<Comment> {
        self.store.load(&keys::comments(post_id))
    }

    pub fn comment_threads(&self, post_id: u64) -> Vec<CommentThread> {
        build_comment_tree(&self.list_comments(post_id))
    }

    pub async fn add_comment(
        &self,
        post_id: u64,
        request: CreateCommentRequest,
        actor: Option<&ActorIdentity>,
    ) -> Result<Comment> {
        let actor = actor.ok_or_else(|| AppError::unauthorized("Login required to comment"))?;

        request.validate()?;
        let content = require_text("Comment", &request.content, self.limits.max_comment_length)?;

        self.find_post(post_id)?;
        let key = keys::comments(post_id);
        let mut comments: Vec<Comment> = self.store.load(&key);

        if let Some(parent_id) = request.parent_id.as_deref() {
            let parent = comments
                .iter()
                .find(|c| c.id == parent_id)
                .ok_or_else(|| AppError::not_found("Parent comment"))?;
            if parent.is_reply() {
                return Err(AppError::validation("Replies cannot be nested"));
            }
        }

        let author = self.resolver.resolve(actor).await;
        let comment = Comment::new(post_id, author, content, request.parent_id, actor.id.clone());

        // Counter first so a failed comment save can be undone.
        self.update_post(post_id, |post| post.comments += 1)?;
        comments.push(comment.clone());
        if let Err(e) = self.store.save(&key, &comments) {
            if let Err(rollback) =
                self.update_post(post_id, |post| post.comments = post.comments.saturating_sub(1))
            {
                warn!("Comment counter of post {} left ahead: {}", post_id, rollback);
            }
            return Err(e);
        }

        info!("Comment {} added to post {}", comment.id, post_id);
        Ok(comment)
    }

    /// Replies of a deleted comment stay stored and drop out of the tree.
    pub fn delete_comment(
        &self,
        post_id: u64,
        comment_id: &str,
        actor: Option<&ActorIdentity>,
    ) -> Result<()> {
        let actor = actor.ok_or_else(|| AppError::unauthorized("Login required"))?;

        let key = keys::comments(post_id);
        let mut comments: Vec<Comment> = self.store.load(&key);
        let index = comments
            .iter()
            .position(|c| c.id == comment_id)
            .ok_or_else(|| AppError::not_found("Comment"))?;

        if !comments[index].is_owned_by(&actor.id) {
            return Err(AppError::forbidden("Only the author can delete this comment"));
        }

        comments.remove(index);
        self.store.save(&key, &comments)?;

        let decremented = self.update_post(post_id, |post| {
            if post.comments == 0 {
                warn!("Comment counter of post {} already at zero", post.id);
            }
            post.comments = post.comments.saturating_sub(1);
        });
        match decremented {
            Ok(_) => {}
            Err(AppError::NotFound(_)) => {
                warn!("Comment {} removed from missing post {}", comment_id, post_id)
            }
            Err(e) => return Err(e),
        }

        info!("Comment {} deleted by {}", comment_id, actor.id);
        Ok(())
    }

    pub fn recommend_post(&self, id: u64, actor: Option<&ActorIdentity>) -> Result<VoteResult> {
        let actor = actor.ok_or_else(|| AppError::unauthorized("Login required to recommend"))?;
        let current = self.find_post(id)?;
        let mut recommends = current.recommends;

        let outcome = cast_vote(&self.ledger, Some(actor), &id, || {
            recommends = self.update_post(id, |post| post.recommends += 1)?.recommends;
            Ok(())
        })?;

        Ok(VoteResult {
            outcome,
            recommends,
        })
    }

    /// Applies `mutate` to the post and persists it, copying seed posts into
    /// the store on first write.
    fn update_post<F>(&self, id: u64, mutate: F) -> Result<Post>
    where
        F: FnOnce(&mut Post),
    {
        let mut posts: Vec<Post> = self.store.load(keys::BOARD_POSTS);

        let updated = match posts.iter_mut().find(|p| p.id == id) {
            Some(post) => {
                mutate(post);
                post.clone()
            }
            None => {
                let mut post = self
                    .seed_posts
                    .iter()
                    .find(|p| p.id == id)
                    .cloned()
                    .ok_or_else(|| AppError::not_found("Post"))?;
                mutate(&mut post);
                posts.push(post.clone());
                post
            }
        };

        self.store.save(keys::BOARD_POSTS, &posts)?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::post::PostCategory;
    use crate::services::profile::InMemoryProfileStore;
    use crate::services::storage::{DurableStorage, MemoryStorage};
    use crate::services::votes::VoteOutcome;

    fn seed_post(id: u64) -> Post {
        Post {
            id,
            category: PostCategory::Tip,
            title: format!("seed {}", id),
            author: "seed".to_string(),
            date: "2024-01-01".to_string(),
            views: 10,
            recommends: 3,
            comments: 0,
            content: None,
            user_id: None,
        }
    }

    fn service() -> BoardService {
        BoardService::new(
            CollectionStore::in_memory(),
            vec![seed_post(1), seed_post(2)],
            IdentityResolver::new(Arc::new(InMemoryProfileStore::new())),
            ContentLimits::default(),
        )
    }

    /// Fails every write to keys starting with `prefix`.
    struct FailingWrites {
        inner: MemoryStorage,
        prefix: &'static str,
    }

    impl DurableStorage for FailingWrites {
        fn get_item(&self, key: &str) -> Result<Option<String>> {
            self.inner.get_item(key)
        }

        fn set_item(&self, key: &str, value: &str) -> Result<()> {
            if key.starts_with(self.prefix) {
                return Err(AppError::internal("disk full"));
            }
            self.inner.set_item(key, value)
        }
    }

    fn actor(id: &str) -> ActorIdentity {
        let mut actor = ActorIdentity::new(id);
        actor.email = Some(format!("{}@example.com", id));
        actor
    }

    fn post_request(title: &str, content: &str) -> CreatePostRequest {
        CreatePostRequest {
            category: PostCategory::Question,
            title: title.to_string(),
            content: content.to_string(),
        }
    }

    fn comment_request(content: &str, parent_id: Option<&str>) -> CreateCommentRequest {
        CreateCommentRequest {
            content: content.to_string(),
            parent_id: parent_id.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn create_post_assigns_next_id_and_zero_counters() {
        let board = service();
        let alice = actor("alice");

        let first = board
            .create_post(post_request(" Hello ", "body"), Some(&alice))
            .await
            .unwrap();
        let second = board
            .create_post(post_request("Again", "body"), Some(&alice))
            .await
            .unwrap();

        assert_eq!(first.id, 101);
        assert_eq!(second.id, 102);
        assert_eq!(first.title, "Hello");
        assert_eq!(first.author, "alice");
        assert_eq!((first.views, first.recommends, first.comments), (0, 0, 0));
        assert_eq!(first.user_id.as_deref(), Some("alice"));

        // Newest first, seeds after.
        let ids: Vec<u64> = board.list_posts().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![102, 101, 1, 2]);
    }

    #[tokio::test]
    async fn create_post_requires_actor_and_text() {
        let board = service();

        assert!(matches!(
            board.create_post(post_request("t", "c"), None).await,
            Err(AppError::Authentication(_))
        ));
        assert!(board
            .create_post(post_request("   ", "c"), Some(&actor("alice")))
            .await
            .is_err());
        assert!(board
            .create_post(post_request("t", "   "), Some(&actor("alice")))
            .await
            .is_err());
        assert_eq!(board.list_posts().len(), 2);
    }

    #[tokio::test]
    async fn create_post_declines_when_ids_are_exhausted() {
        let board = service();
        let mut taken = seed_post(u64::MAX);
        taken.user_id = Some("bob".to_string());
        board.store.save(keys::BOARD_POSTS, &[taken]).unwrap();

        assert!(matches!(
            board.create_post(post_request("t", "c"), Some(&actor("alice"))).await,
            Err(AppError::Internal(_))
        ));
        let ids: Vec<u64> = board.list_posts().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![u64::MAX, 1, 2]);
    }

    #[tokio::test]
    async fn configured_limits_alone_bound_post_length() {
        let limits = ContentLimits {
            max_title_length: 300,
            ..ContentLimits::default()
        };
        let board = BoardService::new(
            CollectionStore::in_memory(),
            Vec::new(),
            IdentityResolver::new(Arc::new(InMemoryProfileStore::new())),
            limits,
        );
        let alice = actor("alice");

        let long_title = "가".repeat(250);
        let post = board
            .create_post(post_request(&long_title, "body"), Some(&alice))
            .await
            .unwrap();
        assert_eq!(post.title.chars().count(), 250);

        assert!(matches!(
            board
                .create_post(post_request(&"가".repeat(301), "body"), Some(&alice))
                .await,
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn get_post_counts_every_read() {
        let board = service();

        for _ in 0..3 {
            board.get_post(1).unwrap();
        }
        let post = board.get_post(1).unwrap();
        assert_eq!(post.views, 14);

        // The seed post is now shadowed by its stored copy.
        let listed: Vec<Post> = board.list_posts().into_iter().filter(|p| p.id == 1).collect();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].views, 14);
    }

    #[test]
    fn get_missing_post_is_not_found() {
        assert!(matches!(service().get_post(999), Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_post_is_owner_only() {
        let board = service();
        let post = board
            .create_post(post_request("mine", "body"), Some(&actor("alice")))
            .await
            .unwrap();

        assert!(matches!(
            board.delete_post(post.id, Some(&actor("mallory"))),
            Err(AppError::Authorization(_))
        ));
        assert_eq!(board.list_posts().len(), 3);

        assert!(board.delete_post(post.id, Some(&actor("alice"))).unwrap());
        assert_eq!(board.list_posts().len(), 2);
    }

    #[test]
    fn deleting_a_seed_post_is_a_no_op() {
        let board = service();
        assert!(!board.delete_post(1, Some(&actor("alice"))).unwrap());
        assert_eq!(board.list_posts().len(), 2);
    }

    #[tokio::test]
    async fn comments_keep_counter_in_lockstep() {
        let board = service();
        let alice = actor("alice");

        let top = board
            .add_comment(1, comment_request("first", None), Some(&alice))
            .await
            .unwrap();
        board
            .add_comment(1, comment_request("reply", Some(&top.id)), Some(&alice))
            .await
            .unwrap();

        assert_eq!(board.find_post(1).unwrap().comments, 2);
        assert_eq!(board.list_comments(1).len(), 2);

        let threads = board.comment_threads(1);
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].replies.len(), 1);

        board.delete_comment(1, &top.id, Some(&alice)).unwrap();
        assert_eq!(board.find_post(1).unwrap().comments, 1);
        // The orphaned reply stays stored but leaves the tree.
        assert_eq!(board.list_comments(1).len(), 1);
        assert!(board.comment_threads(1).is_empty());
    }

    #[tokio::test]
    async fn comment_counter_never_goes_negative() {
        let board = service();
        let alice = actor("alice");
        let comment = board
            .add_comment(2, comment_request("hi", None), Some(&alice))
            .await
            .unwrap();

        // Counter drifted to zero out of band.
        board.update_post(2, |post| post.comments = 0).unwrap();
        board.delete_comment(2, &comment.id, Some(&alice)).unwrap();

        assert_eq!(board.find_post(2).unwrap().comments, 0);
    }

    #[tokio::test]
    async fn failed_comment_save_rolls_back_counter() {
        let storage = Arc::new(FailingWrites {
            inner: MemoryStorage::new(),
            prefix: "comments_",
        });
        let board = BoardService::new(
            CollectionStore::new(storage),
            vec![seed_post(1)],
            IdentityResolver::new(Arc::new(InMemoryProfileStore::new())),
            ContentLimits::default(),
        );

        assert!(board
            .add_comment(1, comment_request("hi", None), Some(&actor("alice")))
            .await
            .is_err());
        assert!(board.list_comments(1).is_empty());
        assert_eq!(board.find_post(1).unwrap().comments, 0);
    }

    #[tokio::test]
    async fn delete_comment_is_owner_only() {
        let board = service();
        let comment = board
            .add_comment(1, comment_request("hi", None), Some(&actor("alice")))
            .await
            .unwrap();

        assert!(matches!(
            board.delete_comment(1, &comment.id, Some(&actor("mallory"))),
            Err(AppError::Authorization(_))
        ));
        assert_eq!(board.list_comments(1).len(), 1);
        assert_eq!(board.find_post(1).unwrap().comments, 1);
    }

    #[tokio::test]
    async fn replies_must_target_existing_top_level_comment() {
        let board = service();
        let alice = actor("alice");
        let top = board
            .add_comment(1, comment_request("top", None), Some(&alice))
            .await
            .unwrap();
        let reply = board
            .add_comment(1, comment_request("reply", Some(&top.id)), Some(&alice))
            .await
            .unwrap();

        assert!(matches!(
            board
                .add_comment(1, comment_request("deep", Some(&reply.id)), Some(&alice))
                .await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            board
                .add_comment(1, comment_request("lost", Some("comment_0_x")), Some(&alice))
                .await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            board.add_comment(1, comment_request("anon", None), None).await,
            Err(AppError::Authentication(_))
        ));
        assert_eq!(board.find_post(1).unwrap().comments, 2);
    }

    #[test]
    fn recommending_twice_counts_once() {
        let board = service();
        let alice = actor("alice");

        let first = board.recommend_post(1, Some(&alice)).unwrap();
        let second = board.recommend_post(1, Some(&alice)).unwrap();

        assert_eq!(first.outcome, VoteOutcome::Accepted);
        assert_eq!(first.recommends, 4);
        assert_eq!(second.outcome, VoteOutcome::AlreadyVoted);
        assert_eq!(second.recommends, 4);
        assert_eq!(board.find_post(1).unwrap().recommends, 4);
        assert!(board.get_post_detail(1).unwrap().recommended);
    }

    #[test]
    fn anonymous_recommend_is_rejected() {
        let board = service();
        assert!(matches!(
            board.recommend_post(1, None),
            Err(AppError::Authentication(_))
        ));
        assert_eq!(board.find_post(1).unwrap().recommends, 3);
    }

    #[test]
    fn anonymous_recommend_of_missing_post_is_unauthenticated() {
        assert!(matches!(
            service().recommend_post(999, None),
            Err(AppError::Authentication(_))
        ));
    }

    #[tokio::test]
    async fn detail_bundles_post_threads_and_vote_state() {
        let board = service();
        board
            .add_comment(2, comment_request("hello", None), Some(&actor("alice")))
            .await
            .unwrap();

        let detail = board.get_post_detail(2).unwrap();
        assert_eq!(detail.post.views, 11);
        assert_eq!(detail.comment_total, 1);
        assert_eq!(detail.comments.len(), 1);
        assert!(!detail.recommended);
    }

    #[test]
    fn browse_rejects_unknown_sort() {
        let query = PostQuery {
            sort: Some("random".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            service().browse_posts(&query),
            Err(AppError::BadRequest(_))
        ));
    }
}
