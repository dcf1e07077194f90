use crate::utils::{collect_reply_ids, is_duplicate_key, mongo_error, search_filter, top_level_filter};
use futures::TryStreamExt;
use mongodb::bson::{self, doc, oid::ObjectId, DateTime, Document};
use mongodb::options::{
    ClientOptions, FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument, ServerApi,
    ServerApiVersion, UpdateOptions,
};
use mongodb::{Client, Collection, Cursor, IndexModel};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use threads_common::errors::ThreadsServerError;
use threads_common::http::requests::OnboardRequest;
use threads_common::http::responses::{
    CommunitiesPage, CommunityCard, CommunityDetails, CommunityThreads, FeedPage, ReplyView,
    ThreadDetail, ThreadView, UserProfile, UserSummary, UserThreads, UsersPage,
};
use threads_common::models::{Community, Thread, User};
use threads_common::utils::{PageRequest, SortOrder};

pub struct ThreadsDB {
    users: Collection<User>,
    threads: Collection<Thread>,
    communities: Collection<Community>,
}

async fn connect(uri: &str) -> Result<Client, ThreadsServerError> {
    let mut client_options = ClientOptions::parse(uri)
        .await
        .map_err(mongo_error("Failed to parse mongodb uri"))?;
    let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
    client_options.server_api = Some(server_api);
    Client::with_options(client_options).map_err(mongo_error("Failed to connect to mongodb"))
}

/// Drain an aggregation cursor into typed documents
async fn collect_as<T: DeserializeOwned>(
    mut cursor: Cursor<Document>,
    action: &'static str,
) -> Result<Vec<T>, ThreadsServerError> {
    let mut results = vec![];
    while let Some(document) = cursor.try_next().await.map_err(mongo_error(action))? {
        let parsed = bson::from_document::<T>(document)
            .map_err(|e| ThreadsServerError::SerdeError(format!("{}: {}", action, e)))?;
        results.push(parsed);
    }
    Ok(results)
}

/// AGGREGATION STAGES ///

fn user_summary_projection() -> Document {
    doc! { "_id": 1, "id": 1, "username": 1, "name": 1, "image": 1 }
}

fn community_summary_projection() -> Document {
    doc! { "_id": 1, "id": 1, "username": 1, "name": 1, "image": 1 }
}

/**
 * Replace a single reference field with the referenced document
 * @dev the field is removed when the reference is null or dangling
 *
 * @param from - collection holding the referenced document
 * @param field - reference field, also used as the output field
 * @param projection - fields kept from the referenced document
 */
fn populate_one(from: &str, field: &str, projection: Document) -> Vec<Document> {
    vec![
        doc! {
            "$lookup": {
                "from": from,
                "localField": field,
                "foreignField": "_id",
                "as": field,
                "pipeline": [{ "$project": projection }]
            }
        },
        doc! { "$set": { field: { "$first": format!("${}", field) } } },
    ]
}

fn populate_members() -> Document {
    doc! {
        "$lookup": {
            "from": "users",
            "localField": "members",
            "foreignField": "_id",
            "as": "members",
            "pipeline": [{ "$project": user_summary_projection() }]
        }
    }
}

/// Stages turning a reply into a `ReplyView`
fn reply_stages() -> Vec<Document> {
    populate_one("users", "author", user_summary_projection())
}

/// Stages turning a thread into a `ThreadView`
fn thread_stages() -> Vec<Document> {
    let mut replies = vec![doc! { "$sort": { "created_at": 1 } }];
    replies.extend(reply_stages());

    let mut stages = populate_one("users", "author", user_summary_projection());
    stages.extend(populate_one("communities", "community", community_summary_projection()));
    stages.push(doc! {
        "$lookup": {
            "from": "threads",
            "localField": "children",
            "foreignField": "_id",
            "as": "children",
            "pipeline": replies
        }
    });
    stages
}

/// Stages turning a thread into a `ThreadDetail` (two levels of replies)
fn thread_detail_stages() -> Vec<Document> {
    let mut children = vec![doc! { "$sort": { "created_at": 1 } }];
    children.extend(thread_stages());

    let mut stages = populate_one("users", "author", user_summary_projection());
    stages.extend(populate_one("communities", "community", community_summary_projection()));
    stages.push(doc! {
        "$lookup": {
            "from": "threads",
            "localField": "children",
            "foreignField": "_id",
            "as": "children",
            "pipeline": children
        }
    });
    stages
}

/// Stages replacing an owner's `threads` ids with `ThreadView`s, newest first
fn populate_owned_threads() -> Document {
    let mut pipeline = vec![doc! { "$sort": { "created_at": -1 } }];
    pipeline.extend(thread_stages());
    doc! {
        "$lookup": {
            "from": "threads",
            "localField": "threads",
            "foreignField": "_id",
            "as": "threads",
            "pipeline": pipeline
        }
    }
}

impl ThreadsDB {
    pub async fn init(uri: &str, database_name: &str) -> Result<Self, ThreadsServerError> {
        let client = connect(uri).await?;
        let db = client.database(database_name);
        let threads_db = Self {
            users: db.collection("users"),
            threads: db.collection("threads"),
            communities: db.collection("communities"),
        };
        threads_db.ensure_indexes().await?;
        tracing::info!("Connected to database {}", database_name);
        Ok(threads_db)
    }

    /**
     * Drops the entire database to start off with clean state for testing
     */
    pub async fn drop(uri: &str, database_name: &str) -> Result<(), ThreadsServerError> {
        let client = connect(uri).await?;
        client
            .database(database_name)
            .drop(None)
            .await
            .map_err(mongo_error("Failed to drop database"))
    }

    async fn ensure_indexes(&self) -> Result<(), ThreadsServerError> {
        let unique = || IndexOptions::builder().unique(true).build();
        self.users
            .create_indexes(
                vec![
                    IndexModel::builder()
                        .keys(doc! { "id": 1 })
                        .options(unique())
                        .build(),
                    IndexModel::builder()
                        .keys(doc! { "username": 1 })
                        .options(unique())
                        .build(),
                ],
                None,
            )
            .await
            .map_err(mongo_error("Failed to index users"))?;
        self.communities
            .create_indexes(
                vec![
                    IndexModel::builder()
                        .keys(doc! { "id": 1 })
                        .options(unique())
                        .build(),
                    IndexModel::builder()
                        .keys(doc! { "username": 1 })
                        .options(unique())
                        .build(),
                ],
                None,
            )
            .await
            .map_err(mongo_error("Failed to index communities"))?;
        self.threads
            .create_indexes(
                vec![
                    IndexModel::builder().keys(doc! { "author": 1 }).build(),
                    IndexModel::builder().keys(doc! { "parent_id": 1 }).build(),
                ],
                None,
            )
            .await
            .map_err(mongo_error("Failed to index threads"))?;
        Ok(())
    }

    /// USER FUNCTIONS ///

    /**
     * Create or update the profile linked to an identity and mark it onboarded
     * @notice - assumes the request was validated
     *
     * @param user_id - identity id from the session
     * @param request - the submitted profile form
     * @returns - UsernameExists if another account holds the username
     */
    pub async fn update_user(
        &self,
        user_id: &str,
        request: &OnboardRequest,
    ) -> Result<(), ThreadsServerError> {
        let username = request.username.trim().to_lowercase();
        let filter = doc! { "id": user_id };
        let update = doc! {
            "$set": {
                "username": username.as_str(),
                "name": request.name.trim(),
                "bio": request.bio.clone(),
                "image": request.image.clone(),
                "onboarded": true,
            },
            "$setOnInsert": {
                "threads": [],
                "communities": [],
                "created_at": DateTime::now(),
            }
        };
        let options = UpdateOptions::builder().upsert(true).build();
        match self.users.update_one(filter, update, options).await {
            Ok(result) => {
                tracing::info!(
                    "Saved profile {} for {} (created: {})",
                    username,
                    user_id,
                    result.upserted_id.is_some()
                );
                Ok(())
            }
            Err(e) if is_duplicate_key(&e) => Err(ThreadsServerError::UsernameExists(username)),
            Err(e) => Err(mongo_error("Failed to create/update user")(e)),
        }
    }

    /**
     * Look up a profile by identity id with its communities
     *
     * @param user_id - identity id issued by the auth provider
     * @returns - None if the identity never saved a profile
     */
    pub async fn fetch_user(&self, user_id: &str) -> Result<Option<UserProfile>, ThreadsServerError> {
        let pipeline = vec![
            doc! { "$match": { "id": user_id } },
            doc! {
                "$lookup": {
                    "from": "communities",
                    "localField": "communities",
                    "foreignField": "_id",
                    "as": "communities",
                    "pipeline": [{ "$project": community_summary_projection() }]
                }
            },
        ];
        let cursor = self
            .users
            .aggregate(pipeline, None)
            .await
            .map_err(mongo_error("Failed to fetch user"))?;
        let users = collect_as::<UserProfile>(cursor, "Failed to fetch user").await?;
        Ok(users.into_iter().next())
    }

    pub async fn fetch_user_posts(
        &self,
        user_id: &str,
    ) -> Result<Option<UserThreads>, ThreadsServerError> {
        let pipeline = vec![
            doc! { "$match": { "id": user_id } },
            doc! { "$project": { "_id": 1, "id": 1, "username": 1, "name": 1, "image": 1, "threads": 1 } },
            populate_owned_threads(),
        ];
        let cursor = self
            .users
            .aggregate(pipeline, None)
            .await
            .map_err(mongo_error("Cannot fetch user threads"))?;
        let users = collect_as::<UserThreads>(cursor, "Cannot fetch user threads").await?;
        Ok(users.into_iter().next())
    }

    /**
     * Search every other user by username or name
     *
     * @param user_id - identity id of the searching user, excluded from the results
     * @param search_string - text to match, empty for everyone
     * @param page - page of results to return
     * @param sort_by - order on profile creation time
     * @returns - the page of users and whether another page follows
     */
    pub async fn fetch_users(
        &self,
        user_id: &str,
        search_string: &str,
        page: PageRequest,
        sort_by: SortOrder,
    ) -> Result<UsersPage, ThreadsServerError> {
        let filter = search_filter(search_string, Some(user_id));
        let options = FindOptions::builder()
            .projection(user_summary_projection())
            .sort(doc! { "created_at": sort_by.direction() })
            .skip(page.skip())
            .limit(page.limit())
            .build();

        let total = self
            .users
            .count_documents(filter.clone(), None)
            .await
            .map_err(mongo_error("Cannot get users"))?;
        let users: Vec<UserSummary> = self
            .users
            .clone_with_type::<UserSummary>()
            .find(filter, options)
            .await
            .map_err(mongo_error("Cannot get users"))?
            .try_collect()
            .await
            .map_err(mongo_error("Cannot get users"))?;

        let is_next = page.is_next(total, users.len());
        Ok(UsersPage { users, is_next })
    }

    /**
     * Replies other users left on threads authored by a user, newest first
     *
     * @param user - _id of the thread author
     */
    pub async fn get_activity(&self, user: &ObjectId) -> Result<Vec<ReplyView>, ThreadsServerError> {
        let authored: Vec<Thread> = self
            .threads
            .find(doc! { "author": *user }, None)
            .await
            .map_err(mongo_error("Could not get activity"))?
            .try_collect()
            .await
            .map_err(mongo_error("Could not get activity"))?;

        let reply_ids = collect_reply_ids(&authored);
        if reply_ids.is_empty() {
            return Ok(vec![]);
        }

        let mut pipeline = vec![
            doc! { "$match": { "_id": { "$in": reply_ids }, "author": { "$ne": *user } } },
            doc! { "$sort": { "created_at": -1 } },
        ];
        pipeline.extend(reply_stages());
        let cursor = self
            .threads
            .aggregate(pipeline, None)
            .await
            .map_err(mongo_error("Could not get activity"))?;
        collect_as::<ReplyView>(cursor, "Could not get activity").await
    }

    /// THREAD FUNCTIONS ///

    /**
     * Insert a new top level thread and reference it from its author and community
     *
     * @param text - validated thread body
     * @param author - _id of the posting user
     * @param community_id - organization id of the community posted in, if any
     * @returns - the _id of the new thread
     */
    pub async fn create_thread(
        &self,
        text: &str,
        author: &ObjectId,
        community_id: Option<&str>,
    ) -> Result<ObjectId, ThreadsServerError> {
        let community = match community_id {
            Some(id) => match self
                .communities
                .find_one(doc! { "id": id }, None)
                .await
                .map_err(mongo_error("Failed to create thread"))?
            {
                Some(community) => community.oid,
                None => return Err(ThreadsServerError::CommunityNotFound(id.to_string())),
            },
            None => None,
        };

        let mut thread = Thread::new(text.trim().to_string(), *author);
        thread.community = community;
        let thread_oid = self
            .threads
            .insert_one(&thread, None)
            .await
            .map_err(mongo_error("Failed to create thread"))?
            .inserted_id
            .as_object_id()
            .ok_or(ThreadsServerError::InternalError)?;

        // push the thread to the author's list of threads
        self.users
            .update_one(
                doc! { "_id": *author },
                doc! { "$push": { "threads": thread_oid } },
                None,
            )
            .await
            .map_err(mongo_error("Failed to create thread"))?;
        if let Some(community) = community {
            self.communities
                .update_one(
                    doc! { "_id": community },
                    doc! { "$push": { "threads": thread_oid } },
                    None,
                )
                .await
                .map_err(mongo_error("Failed to create thread"))?;
        }
        tracing::info!("Thread {} created by {}", thread_oid, author);
        Ok(thread_oid)
    }

    /// Top level threads, newest first
    pub async fn fetch_posts(&self, page: PageRequest) -> Result<FeedPage, ThreadsServerError> {
        let mut pipeline = vec![
            doc! { "$match": top_level_filter() },
            doc! { "$sort": { "created_at": -1 } },
            doc! { "$skip": page.skip() as i64 },
            doc! { "$limit": page.limit() },
        ];
        pipeline.extend(thread_stages());

        let total = self
            .threads
            .count_documents(top_level_filter(), None)
            .await
            .map_err(mongo_error("Failed to fetch posts"))?;
        let cursor = self
            .threads
            .aggregate(pipeline, None)
            .await
            .map_err(mongo_error("Failed to fetch posts"))?;
        let threads = collect_as::<ThreadView>(cursor, "Failed to fetch posts").await?;

        let is_next = page.is_next(total, threads.len());
        Ok(FeedPage { threads, is_next })
    }

    pub async fn fetch_thread_by_id(
        &self,
        thread: &ObjectId,
    ) -> Result<Option<ThreadDetail>, ThreadsServerError> {
        let mut pipeline = vec![doc! { "$match": { "_id": *thread } }];
        pipeline.extend(thread_detail_stages());
        let cursor = self
            .threads
            .aggregate(pipeline, None)
            .await
            .map_err(mongo_error("Failed to fetch thread"))?;
        let threads = collect_as::<ThreadDetail>(cursor, "Failed to fetch thread").await?;
        Ok(threads.into_iter().next())
    }

    /**
     * Reply to an existing thread
     *
     * @param thread - _id of the thread replied to
     * @param text - validated reply body
     * @param user - _id of the replying user
     * @returns - the _id of the reply
     */
    pub async fn add_comment_to_thread(
        &self,
        thread: &ObjectId,
        text: &str,
        user: &ObjectId,
    ) -> Result<ObjectId, ThreadsServerError> {
        let parent = self
            .threads
            .find_one(doc! { "_id": *thread }, None)
            .await
            .map_err(mongo_error("Error adding comment to thread"))?;
        if parent.is_none() {
            return Err(ThreadsServerError::ThreadNotFound(thread.to_hex()));
        }

        let reply = Thread::reply(text.trim().to_string(), *user, thread);
        let reply_oid = self
            .threads
            .insert_one(&reply, None)
            .await
            .map_err(mongo_error("Error adding comment to thread"))?
            .inserted_id
            .as_object_id()
            .ok_or(ThreadsServerError::InternalError)?;

        self.threads
            .update_one(
                doc! { "_id": *thread },
                doc! { "$push": { "children": reply_oid } },
                None,
            )
            .await
            .map_err(mongo_error("Error adding comment to thread"))?;
        tracing::info!("Reply {} added to thread {}", reply_oid, thread);
        Ok(reply_oid)
    }

    /**
     * Collect every thread below `thread` in the reply tree
     * @dev breadth first over parent_id, one query per level
     */
    async fn fetch_descendants(&self, thread: &ObjectId) -> Result<Vec<Thread>, ThreadsServerError> {
        let mut descendants: Vec<Thread> = vec![];
        let mut frontier = vec![thread.to_hex()];
        while !frontier.is_empty() {
            let level: Vec<Thread> = self
                .threads
                .find(doc! { "parent_id": { "$in": frontier.clone() } }, None)
                .await
                .map_err(mongo_error("Failed to delete thread"))?
                .try_collect()
                .await
                .map_err(mongo_error("Failed to delete thread"))?;
            frontier = level
                .iter()
                .filter_map(|child| child.oid.map(|oid| oid.to_hex()))
                .collect();
            descendants.extend(level);
        }
        Ok(descendants)
    }

    /**
     * Delete a thread with all of its replies and every reference to them
     *
     * @param thread - _id of the thread to delete
     * @param requester - _id of the user asking, must be the author
     * @returns - _ids of every deleted thread
     */
    pub async fn delete_thread(
        &self,
        thread: &ObjectId,
        requester: &ObjectId,
    ) -> Result<Vec<ObjectId>, ThreadsServerError> {
        let main = match self
            .threads
            .find_one(doc! { "_id": *thread }, None)
            .await
            .map_err(mongo_error("Failed to delete thread"))?
        {
            Some(main) => main,
            None => return Err(ThreadsServerError::ThreadNotFound(thread.to_hex())),
        };
        if &main.author != requester {
            return Err(ThreadsServerError::NotThreadAuthor(thread.to_hex()));
        }

        let descendants = self.fetch_descendants(thread).await?;
        let mut deleted = vec![*thread];
        let mut authors = HashSet::from([main.author]);
        let mut communities: HashSet<ObjectId> = main.community.into_iter().collect();
        for child in descendants.iter() {
            if let Some(oid) = child.oid {
                deleted.push(oid);
            }
            authors.insert(child.author);
            if let Some(community) = child.community {
                communities.insert(community);
            }
        }

        self.threads
            .delete_many(doc! { "_id": { "$in": deleted.clone() } }, None)
            .await
            .map_err(mongo_error("Failed to delete thread"))?;
        let authors: Vec<ObjectId> = authors.into_iter().collect();
        self.users
            .update_many(
                doc! { "_id": { "$in": authors } },
                doc! { "$pull": { "threads": { "$in": deleted.clone() } } },
                None,
            )
            .await
            .map_err(mongo_error("Failed to delete thread"))?;
        if !communities.is_empty() {
            let communities: Vec<ObjectId> = communities.into_iter().collect();
            self.communities
                .update_many(
                    doc! { "_id": { "$in": communities } },
                    doc! { "$pull": { "threads": { "$in": deleted.clone() } } },
                    None,
                )
                .await
                .map_err(mongo_error("Failed to delete thread"))?;
        }
        // detach a deleted reply from its parent
        if let Some(parent) = main.parent_id.as_deref().and_then(|id| ObjectId::parse_str(id).ok()) {
            self.threads
                .update_one(
                    doc! { "_id": parent },
                    doc! { "$pull": { "children": *thread } },
                    None,
                )
                .await
                .map_err(mongo_error("Failed to delete thread"))?;
        }
        tracing::info!("Deleted thread {} and {} replies", thread, deleted.len() - 1);
        Ok(deleted)
    }

    /// COMMUNITY FUNCTIONS ///

    /**
     * Create a community owned (and joined) by an existing user
     *
     * @param community - organization id, username, name, image and bio
     * @param created_by_id - identity id of the creator
     * @returns - the _id of the community
     */
    pub async fn create_community(
        &self,
        id: &str,
        name: &str,
        username: &str,
        image: Option<String>,
        bio: Option<String>,
        created_by_id: &str,
    ) -> Result<ObjectId, ThreadsServerError> {
        let creator = match self
            .users
            .find_one(doc! { "id": created_by_id }, None)
            .await
            .map_err(mongo_error("Cannot create community"))?
            .and_then(|user| user.oid)
        {
            Some(oid) => oid,
            None => return Err(ThreadsServerError::UserNotFound(created_by_id.to_string())),
        };

        let community = Community {
            oid: None,
            id: id.to_string(),
            username: username.to_string(),
            name: name.to_string(),
            image,
            bio,
            created_by: creator,
            members: vec![creator],
            threads: vec![],
            created_at: DateTime::now(),
        };
        let community_oid = match self.communities.insert_one(&community, None).await {
            Ok(result) => result
                .inserted_id
                .as_object_id()
                .ok_or(ThreadsServerError::InternalError)?,
            Err(e) if is_duplicate_key(&e) => {
                return Err(ThreadsServerError::CommunityExists(username.to_string()))
            }
            Err(e) => return Err(mongo_error("Cannot create community")(e)),
        };

        self.users
            .update_one(
                doc! { "_id": creator },
                doc! { "$addToSet": { "communities": community_oid } },
                None,
            )
            .await
            .map_err(mongo_error("Cannot create community"))?;
        tracing::info!("Community {} created by {}", id, created_by_id);
        Ok(community_oid)
    }

    pub async fn fetch_community_details(
        &self,
        id: &str,
    ) -> Result<Option<CommunityDetails>, ThreadsServerError> {
        let mut pipeline = vec![doc! { "$match": { "id": id } }];
        pipeline.extend(populate_one("users", "created_by", user_summary_projection()));
        pipeline.push(populate_members());
        let cursor = self
            .communities
            .aggregate(pipeline, None)
            .await
            .map_err(mongo_error("Cannot fetch community details"))?;
        let details = collect_as::<CommunityDetails>(cursor, "Cannot fetch community details").await?;
        Ok(details.into_iter().next())
    }

    pub async fn fetch_community_posts(
        &self,
        id: &str,
    ) -> Result<Option<CommunityThreads>, ThreadsServerError> {
        let pipeline = vec![
            doc! { "$match": { "id": id } },
            doc! { "$project": { "_id": 1, "id": 1, "username": 1, "name": 1, "image": 1, "threads": 1 } },
            populate_owned_threads(),
        ];
        let cursor = self
            .communities
            .aggregate(pipeline, None)
            .await
            .map_err(mongo_error("Cannot fetch community threads"))?;
        let posts = collect_as::<CommunityThreads>(cursor, "Cannot fetch community threads").await?;
        Ok(posts.into_iter().next())
    }

    pub async fn fetch_communities(
        &self,
        search_string: &str,
        page: PageRequest,
        sort_by: SortOrder,
    ) -> Result<CommunitiesPage, ThreadsServerError> {
        let filter = search_filter(search_string, None);
        let pipeline = vec![
            doc! { "$match": filter.clone() },
            doc! { "$sort": { "created_at": sort_by.direction() } },
            doc! { "$skip": page.skip() as i64 },
            doc! { "$limit": page.limit() },
            populate_members(),
        ];

        let total = self
            .communities
            .count_documents(filter, None)
            .await
            .map_err(mongo_error("Cannot fetch communities"))?;
        let cursor = self
            .communities
            .aggregate(pipeline, None)
            .await
            .map_err(mongo_error("Cannot fetch communities"))?;
        let communities = collect_as::<CommunityCard>(cursor, "Cannot fetch communities").await?;

        let is_next = page.is_next(total, communities.len());
        Ok(CommunitiesPage {
            communities,
            is_next,
        })
    }

    /// Resolve both sides of a membership change
    async fn membership_pair(
        &self,
        community_id: &str,
        user_id: &str,
        action: &'static str,
    ) -> Result<(Community, ObjectId), ThreadsServerError> {
        let community = match self
            .communities
            .find_one(doc! { "id": community_id }, None)
            .await
            .map_err(mongo_error(action))?
        {
            Some(community) => community,
            None => return Err(ThreadsServerError::CommunityNotFound(community_id.to_string())),
        };
        let user = match self
            .users
            .find_one(doc! { "id": user_id }, None)
            .await
            .map_err(mongo_error(action))?
            .and_then(|user| user.oid)
        {
            Some(oid) => oid,
            None => return Err(ThreadsServerError::UserNotFound(user_id.to_string())),
        };
        Ok((community, user))
    }

    pub async fn add_member_to_community(
        &self,
        community_id: &str,
        member_id: &str,
    ) -> Result<(), ThreadsServerError> {
        const ACTION: &str = "Member could not be added to the community";
        let (community, member) = self.membership_pair(community_id, member_id, ACTION).await?;
        if community.members.contains(&member) {
            return Err(ThreadsServerError::AlreadyMember(
                member_id.to_string(),
                community_id.to_string(),
            ));
        }
        let community_oid = community.oid.ok_or(ThreadsServerError::InternalError)?;

        self.communities
            .update_one(
                doc! { "_id": community_oid },
                doc! { "$addToSet": { "members": member } },
                None,
            )
            .await
            .map_err(mongo_error(ACTION))?;
        self.users
            .update_one(
                doc! { "_id": member },
                doc! { "$addToSet": { "communities": community_oid } },
                None,
            )
            .await
            .map_err(mongo_error(ACTION))?;
        tracing::info!("{} joined community {}", member_id, community_id);
        Ok(())
    }

    pub async fn remove_user_from_community(
        &self,
        user_id: &str,
        community_id: &str,
    ) -> Result<(), ThreadsServerError> {
        const ACTION: &str = "User could not be removed from the community";
        let (community, user) = self.membership_pair(community_id, user_id, ACTION).await?;
        let community_oid = community.oid.ok_or(ThreadsServerError::InternalError)?;

        self.communities
            .update_one(
                doc! { "_id": community_oid },
                doc! { "$pull": { "members": user } },
                None,
            )
            .await
            .map_err(mongo_error(ACTION))?;
        self.users
            .update_one(
                doc! { "_id": user },
                doc! { "$pull": { "communities": community_oid } },
                None,
            )
            .await
            .map_err(mongo_error(ACTION))?;
        tracing::info!("{} left community {}", user_id, community_id);
        Ok(())
    }

    pub async fn update_community_info(
        &self,
        community_id: &str,
        name: &str,
        username: &str,
        image: Option<String>,
    ) -> Result<(), ThreadsServerError> {
        let update = doc! { "$set": { "name": name, "username": username, "image": image } };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        match self
            .communities
            .find_one_and_update(doc! { "id": community_id }, update, options)
            .await
        {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(ThreadsServerError::CommunityNotFound(community_id.to_string())),
            Err(e) if is_duplicate_key(&e) => {
                Err(ThreadsServerError::CommunityExists(username.to_string()))
            }
            Err(e) => Err(mongo_error("Could not update community info")(e)),
        }
    }

    /**
     * Delete a community, its threads and every membership pointing at it
     *
     * @param community_id - organization id of the community
     * @returns - the deleted community document
     */
    pub async fn delete_community(
        &self,
        community_id: &str,
    ) -> Result<Community, ThreadsServerError> {
        const ACTION: &str = "Could not delete community";
        let community = match self
            .communities
            .find_one_and_delete(doc! { "id": community_id }, None)
            .await
            .map_err(mongo_error(ACTION))?
        {
            Some(community) => community,
            None => return Err(ThreadsServerError::CommunityNotFound(community_id.to_string())),
        };
        let community_oid = community.oid.ok_or(ThreadsServerError::InternalError)?;

        let threads: Vec<Thread> = self
            .threads
            .find(doc! { "community": community_oid }, None)
            .await
            .map_err(mongo_error(ACTION))?
            .try_collect()
            .await
            .map_err(mongo_error(ACTION))?;
        let thread_oids: Vec<ObjectId> = threads.iter().filter_map(|thread| thread.oid).collect();
        let authors: Vec<ObjectId> = threads
            .iter()
            .map(|thread| thread.author)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        self.threads
            .delete_many(doc! { "community": community_oid }, None)
            .await
            .map_err(mongo_error(ACTION))?;
        self.users
            .update_many(
                doc! { "communities": community_oid },
                doc! { "$pull": { "communities": community_oid } },
                None,
            )
            .await
            .map_err(mongo_error(ACTION))?;
        if !thread_oids.is_empty() {
            self.users
                .update_many(
                    doc! { "_id": { "$in": authors } },
                    doc! { "$pull": { "threads": { "$in": thread_oids.clone() } } },
                    None,
                )
                .await
                .map_err(mongo_error(ACTION))?;
        }
        tracing::info!(
            "Deleted community {} with {} threads",
            community_id,
            thread_oids.len()
        );
        Ok(community)
    }
}
