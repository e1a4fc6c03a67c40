use super::IconCatalog;

/// AWS resources drawn as diagram nodes, with their icons
static RESOURCES: &[(&str, &str)] = &[
    // Networking
    ("aws_vpc", "https://icons.terrastruct.com/aws%2F_Group%20Icons%2FVirtual-private-cloud-VPC_light-bg.svg"),
    ("aws_subnet", "https://icons.terrastruct.com/aws%2F_Group%20Icons%2FVPC-subnet-private_light-bg.svg"),
    ("aws_internet_gateway", "https://icons.terrastruct.com/aws%2FNetworking%20&%20Content%20Delivery%2FAmazon-VPC_Internet-Gateway_light-bg.svg"),
    ("aws_nat_gateway", "https://icons.terrastruct.com/aws%2FNetworking%20&%20Content%20Delivery%2FAmazon-VPC_NAT-Gateway_light-bg.svg"),
    ("aws_route53_zone", "https://icons.terrastruct.com/aws%2FNetworking%20&%20Content%20Delivery%2FAmazon-Route-53.svg"),
    ("aws_cloudfront_distribution", "https://icons.terrastruct.com/aws%2FNetworking%20&%20Content%20Delivery%2FAmazon-CloudFront.svg"),
    // Load balancing
    ("aws_alb", "https://icons.terrastruct.com/aws%2FNetworking%20&%20Content%20Delivery%2FElastic-Load-Balancing.svg"),
    ("aws_elb", "https://icons.terrastruct.com/aws%2FNetworking%20&%20Content%20Delivery%2FElastic-Load-Balancing_Classic-load-balancer_light-bg.svg"),
    ("aws_lb", "https://icons.terrastruct.com/aws%2FNetworking%20&%20Content%20Delivery%2FElastic-Load-Balancing.svg"),
    // Compute
    ("aws_instance", "https://icons.terrastruct.com/aws%2FCompute%2FAmazon-EC2.svg"),
    ("aws_lambda_function", "https://icons.terrastruct.com/aws%2FCompute%2FAWS-Lambda.svg"),
    ("aws_ecs_cluster", "https://icons.terrastruct.com/aws%2FCompute%2FAmazon-Elastic-Container-Service.svg"),
    ("aws_ecs_service", "https://icons.terrastruct.com/aws%2FCompute%2FAmazon-Elastic-Container-Service_Service_light-bg.svg"),
    ("aws_eks_cluster", "https://icons.terrastruct.com/aws%2FCompute%2FAmazon-Elastic-Kubernetes-Service.svg"),
    // Storage and databases
    ("aws_s3_bucket", "https://icons.terrastruct.com/aws%2FStorage%2FAmazon-Simple-Storage-Service-S3.svg"),
    ("aws_db_instance", "https://icons.terrastruct.com/aws%2FDatabase%2FAmazon-RDS.svg"),
    ("aws_rds_cluster", "https://icons.terrastruct.com/aws%2FDatabase%2FAmazon-Aurora.svg"),
    ("aws_dynamodb_table", "https://icons.terrastruct.com/aws%2FDatabase%2FAmazon-DynamoDB.svg"),
    ("aws_elasticache_cluster", "https://icons.terrastruct.com/aws%2FDatabase%2FAmazon-ElastiCache.svg"),
    // Messaging
    ("aws_sqs_queue", "https://icons.terrastruct.com/aws%2FApplication%20Integration%2FAmazon-Simple-Queue-Service-SQS.svg"),
    ("aws_sns_topic", "https://icons.terrastruct.com/aws%2FApplication%20Integration%2FAmazon-Simple-Notification-Service-SNS.svg"),
];

/// Icon catalog for the `aws` provider
pub struct AwsCatalog;

impl IconCatalog for AwsCatalog {
    fn prefix(&self) -> &'static str {
        "aws"
    }

    fn entries(&self) -> &'static [(&'static str, &'static str)] {
        RESOURCES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ICON_BASE: &str = "https://icons.terrastruct.com/aws%2F";

    #[test]
    fn test_aws_catalog_icons() {
        let catalog = AwsCatalog;

        assert_eq!(catalog.prefix(), "aws");
        assert_eq!(
            catalog.icon("aws_eks_cluster"),
            Some("https://icons.terrastruct.com/aws%2FCompute%2FAmazon-Elastic-Kubernetes-Service.svg")
        );
        assert!(catalog.is_node("aws_vpc"));
        assert!(!catalog.is_node("aws_iam_role"));
        assert_eq!(catalog.icon("aws_invalid_resource"), None);
    }

    #[test]
    fn test_aws_catalog_entries_are_aws_resources() {
        for (name, uri) in AwsCatalog.entries() {
            assert!(name.starts_with("aws_"), "{} is not an aws resource", name);
            assert!(uri.starts_with(ICON_BASE), "{} has unexpected icon {}", name, uri);
        }
    }
}
