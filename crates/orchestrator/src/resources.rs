#![forbid(unsafe_code)]

use crate::error::Error;
use reqwest::Url;
use std::sync::Arc;

/// Ordered, fixed set of resources a grid is built from.
///
/// Cloning is cheap; every clone shares the same parsed URLs.
#[derive(Debug, Clone, Default)]
pub struct ResourceSet(Arc<[Url]>);

impl ResourceSet {
    pub fn new<I, S>(urls: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let urls = urls
            .into_iter()
            .enumerate()
            .map(|(index, url)| {
                let url = url.as_ref();
                Url::parse(url).map_err(|_| Error::InvalidResource {
                    index,
                    url: url.to_owned(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self(urls.into()))
    }

    pub fn total(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Url> {
        self.0.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Url> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_order_and_total() {
        let set = ResourceSet::new(["https://example.org/0.jpg", "https://example.org/1.jpg"])
            .unwrap();
        assert_eq!(set.total(), 2);
        assert_eq!(set.get(1).unwrap().path(), "/1.jpg");
        assert!(set.get(2).is_none());
    }

    #[test]
    fn rejects_relative_url() {
        let err = ResourceSet::new(["https://example.org/ok.jpg", "not a url"]).unwrap_err();
        assert!(matches!(err, Error::InvalidResource { index: 1, .. }));
    }

    #[test]
    fn empty_set_is_valid() {
        let set = ResourceSet::new(Vec::<String>::new()).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.total(), 0);
    }
}
