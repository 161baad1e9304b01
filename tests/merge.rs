// ABOUTME: Integration tests for merging service overrides into a job template.
// ABOUTME: Uses the checked-in fixture job and datacenter files.

mod support;

use pitwall::config::{DatacenterConfig, ServiceConfig};
use pitwall::deploy::{DeployErrorKind, load_job, merge_job};
use pitwall::nomad::{Constraint, Job, META_DC_REGION, META_HOST_GROUP, META_NODE};
use pitwall::types::{ImageRef, ServiceName};
use serde_json::json;
use support::{fixture_config, fixture_root};

fn service_test1() -> ServiceName {
    ServiceName::new("service_test1").unwrap()
}

fn template() -> Job {
    load_job(&fixture_root(), &service_test1()).unwrap().0
}

fn image() -> ImageRef {
    ImageRef::parse("registry.example.com/service_test1:2.0").unwrap()
}

fn datacenter1() -> DatacenterConfig {
    fixture_config().datacenters["datacenter1"].clone()
}

mod placement {
    use super::*;

    #[test]
    fn sets_region_and_datacenter_once() {
        let dc = datacenter1();
        let service = dc.service("service_test1").unwrap();
        let mut job = template();
        job.datacenters = vec!["datacenter1".to_string()];

        let merged = merge_job(&job, &dc, &service_test1(), service, &image()).unwrap();
        assert_eq!(merged.job.region.as_deref(), Some("europe"));
        assert_eq!(merged.job.datacenters, vec!["datacenter1"]);
    }

    #[test]
    fn one_constraint_per_placement_field() {
        let dc = datacenter1();
        let service = ServiceConfig {
            dc_region: "west".to_string(),
            host_group: "app".to_string(),
            node: "app1".to_string(),
            ..Default::default()
        };

        let merged = merge_job(&template(), &dc, &service_test1(), &service, &image()).unwrap();
        assert_eq!(
            merged.job.constraints,
            vec![
                Constraint::equals(META_DC_REGION, "west"),
                Constraint::equals(META_HOST_GROUP, "app"),
                Constraint::equals(META_NODE, "app1"),
            ]
        );
        let json = serde_json::to_value(&merged.job).unwrap();
        assert_eq!(
            json["Constraints"][0],
            json!({"LTarget": "${meta.dc_region}", "RTarget": "west", "Operand": "="})
        );
    }

    #[test]
    fn empty_placement_adds_no_constraints() {
        let merged = merge_job(
            &template(),
            &datacenter1(),
            &service_test1(),
            &ServiceConfig::default(),
            &image(),
        )
        .unwrap();
        assert!(merged.job.constraints.is_empty());
    }
}

mod count {
    use super::*;

    fn merged_count(count: u32) -> Option<u32> {
        let service = ServiceConfig {
            count,
            ..Default::default()
        };
        let merged = merge_job(&template(), &datacenter1(), &service_test1(), &service, &image())
            .unwrap();
        merged.job.task_group("service_test1").unwrap().count
    }

    #[test]
    fn positive_count_overrides() {
        assert_eq!(merged_count(3), Some(3));
    }

    #[test]
    fn zero_count_keeps_job_default() {
        assert_eq!(merged_count(0), Some(2));
    }
}

mod task {
    use super::*;

    #[test]
    fn applies_fixture_overrides_to_matching_task() {
        let dc = datacenter1();
        let service = dc.service("service_test1").unwrap();
        let merged = merge_job(&template(), &dc, &service_test1(), service, &image()).unwrap();

        let task = merged.job.task_group("service_test1").unwrap().task("service_test1").unwrap();
        assert_eq!(task.image(), Some("registry.example.com/service_test1:2.0"));
        assert_eq!(task.config["network_mode"], "host");

        let resources = task.resources.as_ref().unwrap();
        assert_eq!(resources.cpu, Some(64));
        assert_eq!(resources.memory_mb, Some(128));

        let env = task.env.as_ref().unwrap();
        assert_eq!(env["key1"], "key1_set");
        assert_eq!(env["key5"], "key5_set");
        assert_eq!(env["LOG_LEVEL"], "info");
        assert_eq!(env.len(), 6);

        assert_eq!(
            task.config["args"],
            json!(["-argument", "argument_set", "-argument_var1", "argument_var1_set"])
        );
        assert_eq!(
            task.config["volumes"],
            json!([
                "name-of-the-volume1:/path/in/container1",
                "name-of-the-volume2:/path/in/container2"
            ])
        );
    }

    #[test]
    fn leaves_other_tasks_alone() {
        let dc = datacenter1();
        let service = dc.service("service_test1").unwrap();
        let merged = merge_job(&template(), &dc, &service_test1(), service, &image()).unwrap();

        let sidecar = merged.job.task_group("service_test1").unwrap().task("log_shipper").unwrap();
        assert_eq!(sidecar.image(), Some("shipper:1"));
        assert!(sidecar.env.is_none());
        assert!(!sidecar.config.contains_key("args"));
    }

    #[test]
    fn unset_fields_keep_job_values() {
        let merged = merge_job(
            &template(),
            &datacenter1(),
            &service_test1(),
            &ServiceConfig::default(),
            &image(),
        )
        .unwrap();

        let task = merged.job.task_group("service_test1").unwrap().task("service_test1").unwrap();
        assert_eq!(task.resources.as_ref().unwrap().cpu, Some(100));
        assert_eq!(task.env.as_ref().unwrap()["key1"], "from_job");
        assert!(!task.config.contains_key("volumes"));
    }

    #[test]
    fn malformed_volume_is_a_validation_error() {
        let service = ServiceConfig {
            volumes: vec!["just-a-name".to_string()],
            ..Default::default()
        };
        let err = merge_job(&template(), &datacenter1(), &service_test1(), &service, &image())
            .unwrap_err();
        assert_eq!(err.kind(), DeployErrorKind::Validation);
        assert!(err.to_string().contains("just-a-name"));
    }
}

mod purity {
    use super::*;

    #[test]
    fn inputs_are_untouched() {
        let dc = datacenter1();
        let service = dc.service("service_test1").unwrap().clone();
        let job = template();

        let merged = merge_job(&job, &dc, &service_test1(), &service, &image()).unwrap();

        assert_eq!(job, template());
        assert_eq!(service.image.as_ref().map(ToString::to_string).as_deref(), Some("service_test1_image"));
        assert_eq!(merged.service.image, Some(image()));
        assert_eq!(merged.service.count, service.count);
    }

    #[test]
    fn merging_twice_gives_the_same_job() {
        let dc = datacenter1();
        let service = dc.service("service_test1").unwrap();
        let first = merge_job(&template(), &dc, &service_test1(), service, &image()).unwrap();
        let second = merge_job(&template(), &dc, &service_test1(), service, &image()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_group_still_sets_service_image() {
        let job = Job {
            id: Some("service_test1".to_string()),
            ..Default::default()
        };
        let dc = datacenter1();
        let service = dc.service("service_test1").unwrap();
        let merged = merge_job(&job, &dc, &service_test1(), service, &image()).unwrap();

        assert!(merged.job.task_groups.is_empty());
        assert_eq!(merged.service.image, Some(image()));
    }
}
