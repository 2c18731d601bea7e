use std::{
    fmt::{self, Write},
    str::FromStr,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

const META_OPEN: &str = "<ml-metadata>";
const META_CLOSE: &str = "</ml-metadata>";

/// 文章 id，正整数，对应 `posts/<id>.mlmark`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PostId(pub u64);

impl FromStr for PostId {
    type Err = Error;

    /// 只接受纯 ASCII 数字，拒绝 `+1`、`../1` 之类的输入。
    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::Validation("Invalid post id"));
        }
        s.parse()
            .map_err(|_| Error::Validation("Invalid post id"))
            .and_then(PostId::new)
    }
}

impl PostId {
    /// id 从 1 开始，0 不对应任何文章。
    pub fn new(n: u64) -> Result<Self> {
        if n == 0 {
            return Err(Error::Validation("Invalid post id"));
        }
        Ok(Self(n))
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Serialize for PostId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for PostId {
    /// 同时接受 `"12"` 与 `12` 两种写法。
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => PostId::new(n).map_err(serde::de::Error::custom),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// `<ml-metadata>` 块中的字段。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostMeta {
    pub title: String,
    pub tag: String,
    pub cdate: String,
    pub edate: String,
    /// 未识别的 `<ml-*>` 字段，原样保留
    pub extra: Vec<(String, String)>,
}

/// 一篇文章：元信息 + 原始 Markdown 正文
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: PostId,
    pub meta: PostMeta,
    pub body: String,
}

impl Post {
    /// 解析 `.mlmark` 文本。
    ///
    /// 没有元信息块时返回 `None`，列表会跳过这类文件。
    pub fn parse(id: PostId, raw: &str) -> Option<Self> {
        let (meta_block, body) = split_metadata(raw)?;
        Some(Self {
            id,
            meta: parse_meta(meta_block),
            body: body.to_string(),
        })
    }

    /// 序列化为 `.mlmark` 文本。
    pub fn to_mlmark(&self) -> String {
        let mut out = String::from(META_OPEN);
        out.push('\n');
        for (name, value) in [
            ("title", &self.meta.title),
            ("tag", &self.meta.tag),
            ("cdate", &self.meta.cdate),
            ("edate", &self.meta.edate),
        ] {
            push_entry(&mut out, name, value);
        }
        for (name, value) in &self.meta.extra {
            push_entry(&mut out, name, value);
        }
        out.push_str(META_CLOSE);
        out.push_str("\n\n");
        out.push_str(&self.body);
        out
    }
}

fn push_entry(out: &mut String, name: &str, value: &str) {
    let _ = writeln!(out, "<ml-{name}>{value}</ml-{name}>");
}

/// 拆出元信息块与正文，正文去除首尾空白。
fn split_metadata(raw: &str) -> Option<(&str, &str)> {
    let start = raw.find(META_OPEN)? + META_OPEN.len();
    let end = start + raw[start..].find(META_CLOSE)?;
    Some((&raw[start..end], raw[end + META_CLOSE.len()..].trim()))
}

/// 逐行解析 `<ml-NAME>VALUE</ml-NAME>`。
fn parse_meta(block: &str) -> PostMeta {
    let mut meta = PostMeta::default();

    for line in block.lines() {
        let mut rest = line;
        while let Some((name, value, tail)) = next_entry(rest) {
            match name {
                "title" => meta.title = value.to_string(),
                "tag" => meta.tag = value.to_string(),
                "cdate" => meta.cdate = value.to_string(),
                "edate" => meta.edate = value.to_string(),
                other => meta.extra.push((other.to_string(), value.to_string())),
            }
            rest = tail;
        }
    }

    meta
}

fn next_entry(s: &str) -> Option<(&str, &str, &str)> {
    let open = s.find("<ml-")?;
    let after_open = &s[open + 4..];
    let name_end = after_open.find('>')?;
    let name = &after_open[..name_end];
    if name.is_empty() || name.starts_with('/') {
        return None;
    }

    let content = &after_open[name_end + 1..];
    let close = format!("</ml-{name}>");
    let value_end = content.find(&close)?;
    Some((
        name,
        &content[..value_end],
        &content[value_end + close.len()..],
    ))
}

/// 取出原始文本中的标题，不要求完整的元信息块。
pub fn extract_title(raw: &str) -> Option<&str> {
    raw.lines()
        .find_map(|line| next_entry(line).filter(|(name, _, _)| *name == "title"))
        .map(|(_, value, _)| value)
}

/// 新建或编辑文章时提交的内容，字段均已去除首尾空白。
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub title: String,
    pub tag: String,
    pub body: String,
}

impl PostDraft {
    pub fn new(title: Option<&str>, tag: Option<&str>, body: Option<&str>) -> Result<Self> {
        fn field(v: Option<&str>) -> Result<String> {
            match v.map(str::trim) {
                Some(s) if !s.is_empty() => Ok(s.to_string()),
                _ => Err(Error::Validation("title, tag and body are required")),
            }
        }

        Ok(Self {
            title: field(title)?,
            tag: field(tag)?,
            body: field(body)?,
        })
    }
}
