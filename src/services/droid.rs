use std::time::Duration;

use thirtyfour::{prelude::*, ChromiumLikeCapabilities};
use url::Url;

use crate::{configuration::CollectorSettings, error::ScrapeError};

use super::surface::{maps, Locator, MapsSurface};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

const SCROLL_FEED_JS: &str = r#"
const feed = document.querySelector('div[role="feed"]');
if (feed) { feed.scrollTop = feed.scrollHeight; }
"#;

/// A Chrome session driven over WebDriver.
pub struct Droid {
    pub driver: WebDriver,
}

impl Droid {
    pub async fn launch(settings: &CollectorSettings) -> Result<Self, ScrapeError> {
        let mut caps = DesiredCapabilities::chrome();
        if settings.headless {
            caps.set_headless()?;
        }
        let user_agent = fake_user_agent::get_chrome_rua();
        caps.add_arg(&format!("--user-agent={}", user_agent))?;
        caps.add_arg("--lang=pt-BR")?;

        log::info!("Connecting to webdriver at {}", settings.webdriver_url);
        let driver = WebDriver::new(settings.webdriver_url.as_str(), caps).await?;
        driver.maximize_window().await?;

        Ok(Droid { driver })
    }

    pub async fn goto(&self, url: &Url) -> Result<(), ScrapeError> {
        log::info!("Opening {}", url);
        self.driver.goto(url.as_str()).await?;
        Ok(())
    }

    pub async fn quit(self) -> Result<(), ScrapeError> {
        self.driver.quit().await?;
        Ok(())
    }

    async fn first(&self, xpath: &str) -> Result<Option<WebElement>, ScrapeError> {
        Ok(self.driver.find_all(By::XPath(xpath)).await?.into_iter().next())
    }
}

impl MapsSurface for Droid {
    type Listing = WebElement;

    async fn wait_for_listings(&self, timeout: Duration) -> Result<bool, ScrapeError> {
        Ok(self
            .driver
            .query(By::XPath(maps::LISTING))
            .wait(timeout, POLL_INTERVAL)
            .exists()
            .await?)
    }

    async fn scroll_listings(&self) -> Result<(), ScrapeError> {
        self.driver.execute(SCROLL_FEED_JS, vec![]).await?;
        Ok(())
    }

    async fn listing_count(&self) -> Result<usize, ScrapeError> {
        Ok(self.listings().await?.len())
    }

    async fn listings(&self) -> Result<Vec<WebElement>, ScrapeError> {
        Ok(self.driver.find_all(By::XPath(maps::LISTING)).await?)
    }

    async fn open(&self, listing: &WebElement) -> Result<(), ScrapeError> {
        listing.scroll_into_view().await?;
        listing.click().await?;
        Ok(())
    }

    async fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<bool, ScrapeError> {
        let union = locator.union();
        Ok(self
            .driver
            .query(By::XPath(union.as_str()))
            .wait(timeout, POLL_INTERVAL)
            .exists()
            .await?)
    }

    async fn first_text(&self, xpath: &str) -> Result<Option<String>, ScrapeError> {
        match self.first(xpath).await? {
            Some(element) => Ok(Some(element.text().await?)),
            None => Ok(None),
        }
    }

    async fn all_texts(&self, xpath: &str) -> Result<Vec<String>, ScrapeError> {
        let mut texts = vec![];
        for element in self.driver.find_all(By::XPath(xpath)).await? {
            texts.push(element.text().await?);
        }
        Ok(texts)
    }

    async fn first_attribute(
        &self,
        xpath: &str,
        name: &str,
    ) -> Result<Option<String>, ScrapeError> {
        match self.first(xpath).await? {
            Some(element) => Ok(element.attr(name).await?),
            None => Ok(None),
        }
    }
}
