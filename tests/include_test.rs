// tests/include_test.rs
// Nested include reads over posts that own 1000+ tags each.
//
// A bugged database may lose the tag side of the include, which surfaces as an
// "Inconsistent query result" error instead of an empty result.

mod common;

use large_in_repro::fixtures::{clean, create_posts_with_tags, PostsWithTags, POST_ENTITIES};
use large_in_repro::harness::{describe, describe_if, Registry};
use large_in_repro::store::{PostWithTags, Tag, TagOnPost};
use large_in_repro::{Expectation, Store, StoreError};

const INCONSISTENT_TAG: &str =
    "Inconsistent query result: Field tag is required to return data, got `null` instead.";

const MANY_TAGS: PostsWithTags = PostsWithTags {
    n_posts: 2,
    n_tags_per_post: 1000,
};

/// Every post holds exactly the tags the fixture gave it
fn assert_posts_match(posts: &[PostWithTags], shape: PostsWithTags) {
    assert_eq!(posts.len() as i64, shape.n_posts);

    for (post, expected_id) in posts.iter().zip(shape.post_ids()) {
        assert_eq!(post.id, expected_id);
        let tag_ids: Vec<i64> = post.tags.iter().map(|tag| tag.id).collect();
        assert_eq!(tag_ids, shape.tag_ids(post.id), "tags of post {}", post.id);
    }
}

fn register(registry: &mut Registry<Store>, expectation: Expectation) {
    describe(registry, "explicit IN", &mut |suite| {
        suite
            .test("findMany + include with less than 1000 tags per post", |store: Store| async move {
                clean(&store, POST_ENTITIES).await?;
                let shape = PostsWithTags {
                    n_posts: 10,
                    n_tags_per_post: 2,
                };
                let ids = create_posts_with_tags(&store, shape).await?;

                let posts = store.find_many_posts_with_tags(Some(ids.as_slice())).await?;

                assert_eq!(posts.len(), 10);
                assert_eq!(
                    posts[0],
                    PostWithTags {
                        id: 1,
                        tags: vec![Tag { id: 1 }, Tag { id: 2 }],
                    }
                );
                assert_posts_match(&posts, shape);
                Ok(())
            })
            .test("$queryRaw + IN over links after creating 1000+ tags per post", |store: Store| async move {
                clean(&store, POST_ENTITIES).await?;
                let ids = create_posts_with_tags(&store, MANY_TAGS).await?;

                let links: Vec<TagOnPost> = store
                    .query_raw_unsafe(&format!(
                        r#"
                        SELECT * FROM TagOnPost
                        WHERE postId IN ({})
                        ORDER BY postId ASC, tagId ASC
                        "#,
                        common::join_ids(&ids)
                    ))
                    .await?;

                assert_eq!(links.len(), 2000);
                assert_eq!(links[0], TagOnPost { post_id: 1, tag_id: 1 });
                assert_eq!(links[1999], TagOnPost { post_id: 1001, tag_id: 2000 });
                Ok(())
            });
    });

    describe_if(expectation.is_bugged())(registry, "bugged database", &mut |suite| {
        suite.test("findMany + include with at least 1000 tags per post", |store: Store| async move {
            clean(&store, POST_ENTITIES).await?;
            let ids = create_posts_with_tags(&store, MANY_TAGS).await?;

            match store.find_many_posts_with_tags(Some(ids.as_slice())).await {
                Err(err @ StoreError::InconsistentResult { .. }) => {
                    assert!(err.to_string().contains(INCONSISTENT_TAG), "unexpected error: {err}");
                }
                Err(err) => return Err(anyhow::Error::new(err)),
                Ok(posts) => assert_eq!(posts.len(), ids.len()),
            }
            Ok(())
        });
    });

    describe_if(!expectation.is_bugged())(registry, "stable database", &mut |suite| {
        suite
            .test("findMany + include with at least 1000 tags per post", |store: Store| async move {
                clean(&store, POST_ENTITIES).await?;
                let ids = create_posts_with_tags(&store, MANY_TAGS).await?;

                let posts = store.find_many_posts_with_tags(Some(ids.as_slice())).await?;

                assert_posts_match(&posts, MANY_TAGS);
                Ok(())
            })
            .test(
                "findMany + include with at least 1000 tags per post is not influenced by QUERY_BATCH_SIZE=500",
                |store: Store| async move {
                    clean(&store, POST_ENTITIES).await?;
                    let _batch = store.override_query_batch_size(500);

                    create_posts_with_tags(&store, MANY_TAGS).await?;
                    let posts = store.find_many_posts_with_tags(None).await?;

                    assert_posts_match(&posts, MANY_TAGS);
                    Ok(())
                },
            );
    });
}

#[tokio::test]
async fn include_suites() -> anyhow::Result<()> {
    common::init_tracing();
    let mut registry = Registry::new();
    register(&mut registry, Expectation::current());

    common::run_registry(registry).await
}
