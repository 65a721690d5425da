//! Accelerator jar checks

use super::Rule;
use crate::release::LatestRelease;
use crate::tuning::context::TuningContext;
use crate::tuning::ledger::Ledger;
use crate::tuning::version::{is_plugin_jar, plugin_jar_version};

pub const MISSING_JAR_COMMENT: &str = "RAPIDS Accelerator for Apache Spark jar is missing in \
     \"spark.driver.extraClassPath\" and \"spark.executor.extraClassPath\".";
pub const UNVERIFIED_RELEASE_COMMENT: &str =
    "Could not verify the latest RAPIDS Accelerator for Apache Spark release.";

/// Check the accelerator jar on the application's classpath
pub struct ClasspathRule;

impl Rule for ClasspathRule {
    fn name(&self) -> &'static str {
        "classpath"
    }

    fn apply(&self, ctx: &mut TuningContext<'_>, ledger: &mut Ledger) {
        let jars: Vec<&str> = ctx
            .app
            .rapids_jars()
            .iter()
            .map(String::as_str)
            .filter(|jar| is_plugin_jar(jar))
            .collect();

        match jars.as_slice() {
            [] => ledger.add_comment_once(MISSING_JAR_COMMENT),
            [jar] => {
                let Some(current) = plugin_jar_version(jar) else {
                    return;
                };
                match ctx.latest_release {
                    LatestRelease::Known(latest) if current < *latest => {
                        ledger.add_comment_once(format!(
                            "A newer RAPIDS Accelerator for Apache Spark plugin is available: \
                             {latest}. Version used in application is {current}."
                        ));
                    }
                    LatestRelease::Unavailable => {
                        ledger.add_comment_once(UNVERIFIED_RELEASE_COMMENT)
                    }
                    _ => {}
                }
            }
            many => ledger.add_comment_once(format!(
                "Multiple RAPIDS Accelerator for Apache Spark jars exist in the classpath: {}. \
                 Make sure to keep only a single jar.",
                many.join(", ")
            )),
        }
    }
}
