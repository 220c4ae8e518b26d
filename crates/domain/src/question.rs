//! # 質問
//!
//! 質問エンティティと、タイトル・スラッグ・タグなどの値オブジェクトを定義する。
//!
//! ## スラッグ
//!
//! 質問はタイトルから導出したスラッグ（URL 用の識別子）で公開参照される。
//! スラッグは DB の一意制約で重複を防ぐため、同じタイトルの質問は作成できない。
//!
//! ## スコア
//!
//! `score` は投票台帳から導出される純投票数のキャッシュ。
//! 更新は投票ユースケースのトランザクション内でのみ行い、
//! エンティティからは変更メソッドを公開しない。

use chrono::{DateTime, Utc};

use crate::{DomainError, user::UserId};

define_uuid_id! {
    /// 質問 ID（UUID v7）
    pub struct QuestionId;
}

define_validated_string! {
    /// 質問タイトル（1〜255 文字）
    pub struct QuestionTitle {
        label: "タイトル",
        max_length: 255,
    }
}

define_validated_string! {
    /// 質問本文（1〜20,000 文字）
    pub struct QuestionBody {
        label: "本文",
        max_length: 20_000,
    }
}

/// タグ 1 件あたりの最大文字数
const TAG_MAX_LENGTH: usize = 50;

/// スラッグの最大文字数（`questions.slug` の列長）
const SLUG_MAX_LENGTH: usize = 255;

/// URL 用スラッグ
///
/// 英数字（Unicode の英数字を含む）を小文字化して残し、
/// それ以外の文字の連続を 1 つの `-` に置き換える。
/// 小文字化で文字数が増える場合があるため、最大 255 文字で打ち切る。
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Slug(String);

impl Slug {
    /// タイトルからスラッグを導出する
    ///
    /// # Errors
    ///
    /// 英数字を 1 文字も含まないタイトルの場合は `DomainError::Validation`。
    pub fn from_title(title: &QuestionTitle) -> Result<Self, DomainError> {
        let mut slug = String::with_capacity(title.as_str().len());
        let mut length = 0;
        let mut pending_separator = false;

        for c in title.as_str().chars() {
            if !c.is_alphanumeric() {
                pending_separator = true;
                continue;
            }
            if pending_separator && !slug.is_empty() {
                // 区切りの後に 1 文字も入らないなら打ち切る
                if length + 1 >= SLUG_MAX_LENGTH {
                    break;
                }
                slug.push('-');
                length += 1;
            }
            pending_separator = false;
            for lower in c.to_lowercase() {
                if length == SLUG_MAX_LENGTH {
                    break;
                }
                slug.push(lower);
                length += 1;
            }
            if length == SLUG_MAX_LENGTH {
                break;
            }
        }

        if slug.is_empty() {
            return Err(DomainError::Validation(
                "タイトルには英数字を含める必要があります".to_string(),
            ));
        }

        Ok(Self(slug))
    }

    /// DB やパスパラメータから復元する
    pub fn from_string(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Slug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// タグの集合（入力順を保持し、重複を除く）
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Tags(Vec<String>);

impl Tags {
    /// カンマ区切りの入力をパースする
    ///
    /// 各タグは trim と小文字化を行い、空要素は捨てる。
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let mut tags: Vec<String> = Vec::new();
        for raw in input.split(',') {
            let tag = raw.trim().to_lowercase();
            if tag.is_empty() {
                continue;
            }
            if tag.chars().count() > TAG_MAX_LENGTH {
                return Err(DomainError::Validation(format!(
                    "タグは {} 文字以内である必要があります",
                    TAG_MAX_LENGTH
                )));
            }
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        Ok(Self(tags))
    }

    /// DB から復元する
    pub fn from_vec(tags: Vec<String>) -> Self {
        Self(tags)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 質問エンティティ
///
/// # 不変条件
///
/// - `slug` は常に現在の `title` から導出された値
/// - `score` は台帳上の up 票数 − down 票数と一致する
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id:         QuestionId,
    user_id:    UserId,
    title:      QuestionTitle,
    slug:       Slug,
    body:       QuestionBody,
    tags:       Tags,
    view_count: i64,
    score:      i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// 質問の新規作成パラメータ
pub struct NewQuestion {
    pub id:      QuestionId,
    pub user_id: UserId,
    pub title:   QuestionTitle,
    pub body:    QuestionBody,
    pub tags:    Tags,
    pub now:     DateTime<Utc>,
}

/// 質問の DB 復元パラメータ
pub struct QuestionRecord {
    pub id:         QuestionId,
    pub user_id:    UserId,
    pub title:      QuestionTitle,
    pub slug:       Slug,
    pub body:       QuestionBody,
    pub tags:       Tags,
    pub view_count: i64,
    pub score:      i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 質問の編集内容
///
/// `tags` が `None` の場合は既存のタグを維持する。
pub struct QuestionRevision {
    pub title: QuestionTitle,
    pub body:  QuestionBody,
    pub tags:  Option<Tags>,
}

impl Question {
    /// 新しい質問を作成する
    ///
    /// スラッグはタイトルから導出する。閲覧数とスコアは 0 で始まる。
    pub fn new(params: NewQuestion) -> Result<Self, DomainError> {
        let slug = Slug::from_title(&params.title)?;
        Ok(Self {
            id: params.id,
            user_id: params.user_id,
            title: params.title,
            slug,
            body: params.body,
            tags: params.tags,
            view_count: 0,
            score: 0,
            created_at: params.now,
            updated_at: params.now,
        })
    }

    /// 既存のデータから復元する
    pub fn from_db(record: QuestionRecord) -> Self {
        Self {
            id:         record.id,
            user_id:    record.user_id,
            title:      record.title,
            slug:       record.slug,
            body:       record.body,
            tags:       record.tags,
            view_count: record.view_count,
            score:      record.score,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    /// 編集内容を反映した新しいインスタンスを返す
    pub fn revised(self, revision: QuestionRevision, now: DateTime<Utc>) -> Result<Self, DomainError> {
        let slug = Slug::from_title(&revision.title)?;
        Ok(Self {
            title: revision.title,
            slug,
            body: revision.body,
            tags: revision.tags.unwrap_or(self.tags),
            updated_at: now,
            ..self
        })
    }

    /// 指定ユーザーが作成者かどうか
    pub fn is_authored_by(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }

    // Getter メソッド

    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn title(&self) -> &QuestionTitle {
        &self.title
    }

    pub fn slug(&self) -> &Slug {
        &self.slug
    }

    pub fn body(&self) -> &QuestionBody {
        &self.body
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    pub fn view_count(&self) -> i64 {
        self.view_count
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
